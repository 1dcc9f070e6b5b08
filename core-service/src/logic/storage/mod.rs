//! Storage Module - Vector Store
//!
//! Owns the embedding function and the persisted vector records.
//! Mọi attack đều đi qua đây để embed và so sánh vector.
//!
//! ## Structure
//! - `record`: VectorRecord, metadata values, nearest-neighbor hits
//! - `similarity`: cosine similarity, norms, centroids
//! - `collection`: SQLite persistence
//!
//! ## Usage
//! ```ignore
//! let store = VectorStore::in_memory(Arc::new(HashingEmbedder::new(384)?))?;
//! let id = store.store_text("SSN: 123-45-6789", Metadata::new())?;
//! let target = store.get_vector(&id)?;
//! ```

pub mod collection;
pub mod record;
pub mod similarity;


use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::config::EngineConfig;
use super::embedding::{build_embedder, check_batch_dimension, Embedder};
use super::error::{Result, VectorScopeError};

pub use collection::SqliteCollection;
pub use record::{Metadata, MetadataValue, SimilarHit, VectorRecord, KEY_LABEL, KEY_ORIGINAL_TEXT, KEY_TEXT_LENGTH};
pub use similarity::{cosine_similarity, mean_vector};

// ============================================================================
// VECTOR STORE
// ============================================================================

/// Embedding function + persistent collection
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    collection: SqliteCollection,
}

impl VectorStore {
    /// Open the collection file at `path`
    pub fn open(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let store = Self::with_collection(SqliteCollection::open(path)?, embedder)?;
        log::info!("Opened vector collection {:?} ({} records)", path, store.count()?);
        Ok(store)
    }

    /// Volatile store
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::with_collection(SqliteCollection::open_in_memory()?, embedder)
    }

    /// Build embedder and open the collection described by `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let embedder = build_embedder(&config.backend)?;
        Self::open(&config.db_path, embedder)
    }

    /// Bind the collection to the embedder, refusing a dimension change
    fn with_collection(collection: SqliteCollection, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dimension = embedder.dimension();

        match collection.get_meta(collection::META_DIMENSION)? {
            Some(stored) => {
                let stored: usize = stored.parse().map_err(|_| {
                    VectorScopeError::InvalidInput(format!("corrupt collection dimension: {}", stored))
                })?;
                if stored != dimension {
                    return Err(VectorScopeError::DimensionMismatch {
                        expected: stored,
                        actual: dimension,
                    });
                }
                if let Some(model) = collection.get_meta(collection::META_MODEL)? {
                    if model != embedder.model_name() {
                        log::warn!(
                            "Collection was built with '{}', now embedding with '{}'",
                            model,
                            embedder.model_name()
                        );
                    }
                }
            }
            None => {
                collection.set_meta(collection::META_DIMENSION, &dimension.to_string())?;
                collection.set_meta(collection::META_MODEL, embedder.model_name())?;
            }
        }

        Ok(Self { embedder, collection })
    }

    /// Fixed embedding dimension of this store
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    // ------------------------------------------------------------------------
    // Embedding
    // ------------------------------------------------------------------------

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed_text(text)?;
        check_batch_dimension(std::slice::from_ref(&vector), self.dimension())?;
        Ok(vector)
    }

    /// Embed many texts with one backend call
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.embedder.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(VectorScopeError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        check_batch_dimension(&vectors, self.dimension())?;
        Ok(vectors)
    }

    // ------------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------------

    /// Embed and persist `text`; returns the new record id
    pub fn store_text(&self, text: &str, metadata: Metadata) -> Result<String> {
        let embedding = self.embed_text(text)?;

        let mut metadata = metadata;
        metadata.insert(KEY_ORIGINAL_TEXT.to_string(), text.into());
        metadata.insert(KEY_TEXT_LENGTH.to_string(), (text.chars().count() as i64).into());

        // Millisecond precision, same as the collection column
        let created_at = Utc
            .timestamp_millis_opt(Utc::now().timestamp_millis())
            .single()
            .unwrap_or_else(Utc::now);

        let record = VectorRecord {
            id: uuid::Uuid::new_v4().to_string(),
            embedding,
            metadata,
            created_at,
        };
        self.collection.insert(&record)?;

        log::debug!("Stored vector {} ({} chars)", record.id, text.chars().count());
        Ok(record.id)
    }

    pub fn get_record(&self, id: &str) -> Result<VectorRecord> {
        self.collection
            .get(id)?
            .ok_or_else(|| VectorScopeError::NotFound { id: id.to_string() })
    }

    pub fn get_vector(&self, id: &str) -> Result<Vec<f32>> {
        Ok(self.get_record(id)?.embedding)
    }

    pub fn get_metadata(&self, id: &str) -> Result<Metadata> {
        Ok(self.get_record(id)?.metadata)
    }

    /// Every record, insertion order
    pub fn get_all_vectors(&self) -> Result<Vec<VectorRecord>> {
        self.collection.all()
    }

    /// Most recently stored record, if any
    pub fn latest(&self) -> Result<Option<VectorRecord>> {
        self.collection.latest()
    }

    pub fn count(&self) -> Result<usize> {
        self.collection.count()
    }

    /// Remove all records
    pub fn clear(&self) -> Result<()> {
        self.collection.clear()?;
        log::info!("Cleared all vectors");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Similarity
    // ------------------------------------------------------------------------

    /// Cosine similarity; fails on degenerate or mismatched vectors
    pub fn compute_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        cosine_similarity(a, b)
    }

    /// Up to `top_k` records by increasing cosine distance to `query`
    pub fn find_similar(&self, query: &[f32], top_k: usize) -> Result<Vec<SimilarHit>> {
        if query.len() != self.dimension() {
            return Err(VectorScopeError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut hits = self
            .collection
            .all()?
            .into_iter()
            .map(|record| {
                let similarity = cosine_similarity(query, &record.embedding)?;
                Ok(SimilarHit {
                    distance: 1.0 - similarity,
                    record,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable: equal distances keep insertion order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }
}
