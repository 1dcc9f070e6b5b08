//! Similarity Attack - brute-force candidate scoring
//!
//! Generate syntactically valid candidates, embed them in one batch and keep
//! the one closest to the target vector.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map};

use super::candidates::CandidatePool;
use super::result::{to_confidence, AttackResult, KEY_RAW_SIMILARITY};
use super::template::TemplateRegistry;
use crate::logic::config::EngineConfig;
use crate::logic::error::{Result, VectorScopeError};
use crate::logic::storage::VectorStore;

pub const SIMILARITY_METHOD: &str = "Similarity Attack";
pub const INCREMENTAL_METHOD: &str = "Similarity Attack (Incremental)";

const TOP_SIMILARITIES: usize = 5;

pub struct SimilarityAttack {
    store: Arc<VectorStore>,
    templates: Arc<TemplateRegistry>,
    pool: CandidatePool,
    /// Success threshold
    threshold: f32,
    /// Incremental search stops once confidence exceeds this
    early_stop: f32,
    default_sample_size: usize,
    schedule: Vec<usize>,
    default_max_rounds: usize,
}

impl SimilarityAttack {
    pub fn new(store: Arc<VectorStore>, templates: Arc<TemplateRegistry>, config: &EngineConfig) -> Self {
        Self {
            store,
            templates,
            pool: CandidatePool::new(config.seed),
            threshold: config.thresholds.similarity,
            early_stop: config.thresholds.early_stop,
            default_sample_size: config.sample_size,
            schedule: config.incremental_schedule.clone(),
            default_max_rounds: config.max_rounds,
        }
    }

    pub fn default_sample_size(&self) -> usize {
        self.default_sample_size
    }

    /// Score `sample_size` candidates against `target`
    pub fn execute(&self, target: &[f32], data_type: &str, sample_size: usize) -> Result<AttackResult> {
        if sample_size == 0 {
            return Err(VectorScopeError::InvalidInput("sample size must be positive".to_string()));
        }

        let start = Instant::now();
        let template = self.templates.get(data_type)?;
        let candidates = self.pool.take(template, sample_size);

        log::info!("Computing embeddings for {} candidates...", candidates.len());
        let embeddings = self.store.embed_batch(&candidates)?;

        let similarities = embeddings
            .iter()
            .map(|e| self.store.compute_similarity(target, e))
            .collect::<Result<Vec<f32>>>()?;

        // First maximum wins
        let mut best_idx = 0;
        for (i, sim) in similarities.iter().enumerate() {
            if *sim > similarities[best_idx] {
                best_idx = i;
            }
        }
        let best_similarity = similarities[best_idx];
        let confidence = to_confidence(best_similarity);

        let mut top = similarities.clone();
        top.sort_by(|a, b| b.total_cmp(a));
        top.truncate(TOP_SIMILARITIES);

        log::debug!(
            "Best {} candidate: {} (similarity {:.4})",
            template.name,
            candidates[best_idx],
            best_similarity
        );

        let mut metadata = Map::new();
        metadata.insert("data_type".to_string(), json!(template.name));
        metadata.insert("sample_size".to_string(), json!(sample_size));
        metadata.insert("top_5_similarities".to_string(), json!(top));
        metadata.insert(KEY_RAW_SIMILARITY.to_string(), json!(best_similarity));

        Ok(AttackResult {
            success: confidence > self.threshold,
            extracted_text: Some(candidates[best_idx].clone()),
            confidence,
            method: SIMILARITY_METHOD.to_string(),
            num_queries: candidates.len(),
            time_seconds: start.elapsed().as_secs_f64(),
            metadata,
        })
    }

    /// Growing sample sizes, keep the best round, stop early on a near hit
    pub fn incremental_search(&self, target: &[f32], data_type: &str, max_rounds: usize) -> Result<AttackResult> {
        if max_rounds == 0 || self.schedule.is_empty() {
            return Err(VectorScopeError::InvalidInput(
                "incremental search needs at least one round".to_string(),
            ));
        }

        let start = Instant::now();
        let mut best: Option<AttackResult> = None;
        let mut total_queries = 0;
        let mut rounds = 0;

        for &size in self.schedule.iter().take(max_rounds) {
            log::info!("Round {}: Testing {} candidates...", rounds + 1, size);
            let result = self.execute(target, data_type, size)?;
            total_queries += result.num_queries;
            rounds += 1;

            let stop = result.confidence > self.early_stop;
            let improved = best.as_ref().map_or(true, |b| result.confidence > b.confidence);
            if improved {
                best = Some(result);
            }
            if stop {
                log::info!("Found high-confidence match after {} rounds", rounds);
                break;
            }
        }

        let mut best = best.ok_or_else(|| {
            VectorScopeError::InvalidInput("incremental search ran no rounds".to_string())
        })?;
        best.method = INCREMENTAL_METHOD.to_string();
        best.num_queries = total_queries;
        best.time_seconds = start.elapsed().as_secs_f64();
        best.metadata.insert("rounds".to_string(), json!(rounds));
        Ok(best)
    }

    pub fn default_max_rounds(&self) -> usize {
        self.default_max_rounds
    }
}
