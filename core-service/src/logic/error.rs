//! Engine Errors
//!
//! Một error enum duy nhất cho toàn bộ engine.
//! Lookup failures and unsupported templates are caller contract violations and
//! surface immediately; embedding failures abort the running attack.

use thiserror::Error;

/// Errors raised by the vector store, the embedding backends and the attacks
#[derive(Error, Debug)]
pub enum VectorScopeError {
    /// Unknown vector id
    #[error("Vector not found: {id}")]
    NotFound { id: String },

    /// Attack requested for a template it does not implement
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Similarity requested on a zero / near-zero norm vector
    #[error("Degenerate vector: norm is (near) zero")]
    DegenerateVector,

    /// Embedding backend cannot be reached or loaded
    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Vector length does not match the store / embedder dimension
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid attack or store parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// SQLite collection error
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Metadata / report serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VectorScopeError>;
