//! Remote Embedder - OpenAI-compatible HTTP embedding endpoint
//!
//! Works with any server exposing `POST /v1/embeddings` (Ollama, vLLM, OpenAI).
//! Batches larger than the configured request size are split into
//! consecutive requests; output order follows input order.

use std::time::Duration;

use serde::Deserialize;

use super::{check_batch_dimension, Embedder};
use crate::logic::error::{Result, VectorScopeError};

/// Request timeout
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Text embedded once at connect time to learn the dimension
const DIMENSION_PROBE: &str = "dimension probe";

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// HTTP embedding client
pub struct RemoteEmbedder {
    base_url: String,
    model: String,
    dimension: usize,
    max_batch_size: usize,
    agent: ureq::Agent,
}

impl RemoteEmbedder {
    /// Connect and probe the endpoint for its embedding dimension
    pub fn connect(base_url: &str, model: &str, max_batch_size: usize) -> Result<Self> {
        if max_batch_size == 0 {
            return Err(VectorScopeError::InvalidInput(
                "embedding batch size must be positive".to_string(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build();

        let mut embedder = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension: 0,
            max_batch_size,
            agent,
        };

        let probe = embedder.request(&[DIMENSION_PROBE.to_string()])?;
        embedder.dimension = probe
            .first()
            .map(|v| v.len())
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                VectorScopeError::EmbeddingUnavailable("probe returned an empty embedding".to_string())
            })?;

        Ok(embedder)
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .map_err(|e| VectorScopeError::EmbeddingUnavailable(format!("{}: {}", url, e)))?;

        let raw = response
            .into_string()
            .map_err(|e| VectorScopeError::EmbeddingUnavailable(e.to_string()))?;

        let mut parsed: EmbeddingResponse = serde_json::from_str(&raw).map_err(|e| {
            VectorScopeError::EmbeddingUnavailable(format!("malformed embedding response: {}", e))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(VectorScopeError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

impl Embedder for RemoteEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = embed_in_chunks(texts, self.max_batch_size, |chunk| self.request(chunk))?;
        check_batch_dimension(&vectors, self.dimension)?;
        Ok(vectors)
    }
}

/// Run `request` over consecutive chunks of at most `max_batch_size` texts
fn embed_in_chunks<F>(texts: &[String], max_batch_size: usize, mut request: F) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(&[String]) -> Result<Vec<Vec<f32>>>,
{
    let mut vectors = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(max_batch_size.max(1)) {
        if texts.len() > chunk.len() {
            log::debug!("Embedding request of {} / {} texts", chunk.len(), texts.len());
        }
        vectors.extend(request(chunk)?);
    }
    Ok(vectors)
}
