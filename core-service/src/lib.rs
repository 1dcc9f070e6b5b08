//! VectorScope Core - embedding inversion attack engine
//!
//! Measures how much of the original text leaks from a text embedding:
//! candidate search, segment-wise reconstruction and category inference
//! against a vector store.

pub mod constants;
pub mod logic;

pub use logic::attacks::{
    evaluate, options_for, Attack, AttackKind, AttackOptions, AttackResult, DataTemplate, Evaluation,
    TemplateRegistry,
};
pub use logic::config::{AttackThresholds, EmbeddingBackend, EngineConfig};
pub use logic::embedding::{build_embedder, Embedder, HashingEmbedder, RemoteEmbedder};
pub use logic::error::{Result, VectorScopeError};
pub use logic::storage::{Metadata, MetadataValue, VectorRecord, VectorStore};
