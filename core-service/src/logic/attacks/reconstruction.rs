//! Reconstruction Attack - segment-wise greedy beam search
//!
//! Start from the all-zero template and fix one digit segment at a time.
//! Every beam member spawns mutations of the current segment; survivors are
//! the best `beam_width` strings of the pool (previous beam included). A
//! segment is never revisited once optimized.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Map};

use super::result::{to_confidence, AttackResult, KEY_RAW_SIMILARITY};
use super::template::{DataTemplate, TemplateRegistry};
use crate::logic::config::EngineConfig;
use crate::logic::error::{Result, VectorScopeError};
use crate::logic::storage::VectorStore;

pub const RECONSTRUCTION_METHOD: &str = "Reconstruction Attack";

/// Candidate string with its similarity to the target
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub text: String,
    pub score: f32,
}

/// Raw search output before it becomes an `AttackResult`
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub best: Scored,
    pub initial_score: f32,
    /// Best similarity after each segment
    pub segment_scores: Vec<f32>,
    /// Embedded strings so far (final re-embedding excluded)
    pub queries: usize,
}

pub struct ReconstructionAttack {
    store: Arc<VectorStore>,
    templates: Arc<TemplateRegistry>,
    seed: u64,
    threshold: f32,
    default_beam_width: usize,
}

impl ReconstructionAttack {
    pub fn new(store: Arc<VectorStore>, templates: Arc<TemplateRegistry>, config: &EngineConfig) -> Self {
        Self {
            store,
            templates,
            seed: config.seed,
            threshold: config.thresholds.reconstruction,
            default_beam_width: config.beam_width,
        }
    }

    pub fn default_beam_width(&self) -> usize {
        self.default_beam_width
    }

    pub fn execute(&self, target: &[f32], data_type: &str, beam_width: usize) -> Result<AttackResult> {
        let start = Instant::now();
        let template = self.templates.get(data_type)?;

        let search = self.reconstruct(target, template, beam_width)?;

        // Re-embed the winner for the reported confidence
        let final_vector = self.store.embed_text(&search.best.text)?;
        let final_similarity = self.store.compute_similarity(target, &final_vector)?;
        let confidence = to_confidence(final_similarity);

        let mut metadata = Map::new();
        metadata.insert("data_type".to_string(), json!(template.name));
        metadata.insert("beam_width".to_string(), json!(beam_width));
        metadata.insert("segment_scores".to_string(), json!(search.segment_scores));
        metadata.insert("initial_similarity".to_string(), json!(search.initial_score));
        metadata.insert(KEY_RAW_SIMILARITY.to_string(), json!(final_similarity));

        Ok(AttackResult {
            success: confidence > self.threshold,
            extracted_text: Some(search.best.text),
            confidence,
            method: RECONSTRUCTION_METHOD.to_string(),
            num_queries: search.queries + 1,
            time_seconds: start.elapsed().as_secs_f64(),
            metadata,
        })
    }

    /// Beam search over `template`'s segments
    pub fn reconstruct(&self, target: &[f32], template: &DataTemplate, beam_width: usize) -> Result<Reconstruction> {
        if beam_width == 0 {
            return Err(VectorScopeError::InvalidInput("beam width must be positive".to_string()));
        }

        // Fresh generator per run: same seed, same search
        let mut rng = StdRng::seed_from_u64(self.seed);

        let initial = template.zero_template.clone();
        let initial_vector = self.store.embed_text(&initial)?;
        let initial_score = self.store.compute_similarity(target, &initial_vector)?;
        let mut queries = 1;

        log::info!("Starting reconstruction from '{}' (similarity {:.4})", initial, initial_score);

        let mut beam = vec![Scored {
            text: initial,
            score: initial_score,
        }];
        let mut segment_scores = Vec::with_capacity(template.segments.len());

        for segment in &template.segments {
            let mut mutations = Vec::with_capacity(beam.len() * segment.mutations);
            for member in &beam {
                for _ in 0..segment.mutations {
                    mutations.push(segment.mutate(&member.text, &mut rng));
                }
            }

            let embeddings = self.store.embed_batch(&mutations)?;
            queries += mutations.len();

            let mut pool = beam;
            for (text, embedding) in mutations.into_iter().zip(embeddings.iter()) {
                let score = self.store.compute_similarity(target, embedding)?;
                pool.push(Scored { text, score });
            }

            beam = select_top(pool, beam_width);
            let best_score = beam.first().map_or(f32::NEG_INFINITY, |b| b.score);
            segment_scores.push(best_score);

            log::info!(
                "Segment {}..{}: best similarity {:.4}",
                segment.start,
                segment.end,
                best_score
            );
        }

        let best = beam.into_iter().next().ok_or_else(|| {
            VectorScopeError::InvalidInput("reconstruction beam is empty".to_string())
        })?;

        Ok(Reconstruction {
            best,
            initial_score,
            segment_scores,
            queries,
        })
    }
}

/// Best `width` distinct strings; ties keep pool order
pub fn select_top(mut pool: Vec<Scored>, width: usize) -> Vec<Scored> {
    // sort_by is stable
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    let mut top = Vec::with_capacity(width);
    for item in pool {
        if top.len() == width {
            break;
        }
        if seen.insert(item.text.clone()) {
            top.push(item);
        }
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, score: f32) -> Scored {
        Scored {
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn test_select_top_orders_and_truncates() {
        let pool = vec![scored("a", 0.1), scored("b", 0.9), scored("c", 0.5), scored("d", 0.7)];
        let top = select_top(pool, 2);
        assert_eq!(top, vec![scored("b", 0.9), scored("d", 0.7)]);
    }

    #[test]
    fn test_select_top_ties_keep_generation_order() {
        let pool = vec![scored("x", 0.5), scored("y", 0.5), scored("z", 0.5)];
        let top = select_top(pool, 2);
        assert_eq!(top[0].text, "x");
        assert_eq!(top[1].text, "y");
    }

    #[test]
    fn test_select_top_drops_duplicates() {
        let pool = vec![scored("same", 0.8), scored("same", 0.8), scored("other", 0.2)];
        let top = select_top(pool, 3);
        assert_eq!(top, vec![scored("same", 0.8), scored("other", 0.2)]);
    }
}
