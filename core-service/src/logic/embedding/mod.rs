//! Embedding Module - Embedding Function Backends
//!
//! The store and the attacks only see the [`Embedder`] trait.
//! Dễ dàng swap backend: local hashing embedder hoặc remote HTTP endpoint.

pub mod hashing;
pub mod remote;

use std::sync::Arc;

use super::config::EmbeddingBackend;
use super::error::{Result, VectorScopeError};

pub use hashing::HashingEmbedder;
pub use remote::RemoteEmbedder;

// ============================================================================
// EMBEDDER TRAIT
// ============================================================================

/// Black-box embedding function
///
/// Implementations must be deterministic for a fixed model and return vectors
/// of exactly [`Embedder::dimension`] components.
pub trait Embedder: Send + Sync {
    /// Model identifier persisted alongside the collection
    fn model_name(&self) -> &str;

    /// Constant embedding dimension
    fn dimension(&self) -> usize;

    /// Embed many texts in a single backend call
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed one text
    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| VectorScopeError::EmbeddingUnavailable("backend returned no embedding".to_string()))
    }
}

/// Build the embedder selected by the configuration
pub fn build_embedder(backend: &EmbeddingBackend) -> Result<Arc<dyn Embedder>> {
    match backend {
        EmbeddingBackend::Hashing { dimension } => {
            let embedder = HashingEmbedder::new(*dimension)?;
            log::info!("Using hashing embedder (dimension: {})", dimension);
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Remote { url, model, batch_size } => {
            log::info!("Connecting to embedding endpoint {} (model: {})...", url, model);
            let embedder = RemoteEmbedder::connect(url, model, *batch_size)?;
            log::info!("Model loaded (dimension: {})", embedder.dimension());
            Ok(Arc::new(embedder))
        }
    }
}

/// Check every vector of a batch against the expected dimension
pub(crate) fn check_batch_dimension(vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(VectorScopeError::DimensionMismatch {
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}
