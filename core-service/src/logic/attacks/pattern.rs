//! Pattern Attack - category inference from centroids
//!
//! Không khôi phục text, chỉ đoán loại dữ liệu: mỗi template có một centroid
//! (mean embedding of generated samples) and the target is assigned to the
//! closest one.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Map};

use super::result::{to_confidence, AttackResult, KEY_RAW_SIMILARITY};
use super::template::TemplateRegistry;
use crate::logic::config::EngineConfig;
use crate::logic::error::{Result, VectorScopeError};
use crate::logic::storage::{mean_vector, VectorStore};

pub const PATTERN_METHOD: &str = "Pattern Attack";

/// Mean embedding of one data type
#[derive(Debug, Clone)]
pub struct Centroid {
    pub data_type: String,
    pub label: String,
    pub vector: Vec<f32>,
}

pub struct PatternAttack {
    store: Arc<VectorStore>,
    centroids: Vec<Centroid>,
    threshold: f32,
}

impl PatternAttack {
    /// Precompute one centroid per registered template
    pub fn new(store: Arc<VectorStore>, templates: &TemplateRegistry, config: &EngineConfig) -> Result<Self> {
        let samples = config.centroid_samples;
        if samples == 0 {
            return Err(VectorScopeError::InvalidInput(
                "centroid sample count must be positive".to_string(),
            ));
        }
        if templates.is_empty() {
            return Err(VectorScopeError::InvalidInput("no templates registered".to_string()));
        }

        log::info!("Precomputing pattern centroids ({} samples per type)...", samples);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut centroids = Vec::with_capacity(templates.len());
        for template in templates.iter() {
            let texts: Vec<String> = (0..samples).map(|_| template.generate(&mut rng)).collect();
            let embeddings = store.embed_batch(&texts)?;
            centroids.push(Centroid {
                data_type: template.name.clone(),
                label: template.label.clone(),
                vector: mean_vector(&embeddings)?,
            });
        }

        Ok(Self {
            store,
            centroids,
            threshold: config.thresholds.pattern,
        })
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn centroid(&self, data_type: &str) -> Option<&Centroid> {
        self.centroids.iter().find(|c| c.data_type == data_type)
    }

    pub fn execute(&self, target: &[f32]) -> Result<AttackResult> {
        let start = Instant::now();

        let similarities = self
            .centroids
            .iter()
            .map(|c| self.store.compute_similarity(target, &c.vector))
            .collect::<Result<Vec<f32>>>()?;

        let mut best_idx = 0;
        for (i, sim) in similarities.iter().enumerate() {
            if *sim > similarities[best_idx] {
                best_idx = i;
            }
        }
        let detected = &self.centroids[best_idx];
        let best_similarity = similarities[best_idx];
        let confidence = to_confidence(best_similarity);

        log::info!("Detected pattern {} (similarity {:.4})", detected.data_type, best_similarity);

        let table: Map<String, serde_json::Value> = self
            .centroids
            .iter()
            .zip(similarities.iter())
            .map(|(c, s)| (c.data_type.clone(), json!(s)))
            .collect();

        let mut metadata = Map::new();
        metadata.insert("similarities".to_string(), serde_json::Value::Object(table));
        metadata.insert("detected_type".to_string(), json!(detected.data_type));
        metadata.insert("detected_label".to_string(), json!(detected.label));
        metadata.insert(KEY_RAW_SIMILARITY.to_string(), json!(best_similarity));

        Ok(AttackResult {
            success: confidence > self.threshold,
            extracted_text: Some(format!("Detected pattern: {}", detected.data_type)),
            confidence,
            method: PATTERN_METHOD.to_string(),
            num_queries: 1,
            time_seconds: start.elapsed().as_secs_f64(),
            metadata,
        })
    }
}
