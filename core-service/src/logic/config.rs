//! Engine Configuration
//!
//! Gom toàn bộ tham số của engine: backend, thresholds, kích thước tìm kiếm.
//! Defaults live in `crate::constants`; `from_env` applies overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{self, env_parse};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Success thresholds of the attacks (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackThresholds {
    /// Similarity attack: success when confidence exceeds this
    pub similarity: f32,

    /// Incremental similarity: stop widening once confidence exceeds this
    pub early_stop: f32,

    /// Reconstruction attack: success when confidence exceeds this
    pub reconstruction: f32,

    /// Pattern attack: success when centroid similarity exceeds this
    pub pattern: f32,
}

impl Default for AttackThresholds {
    fn default() -> Self {
        Self {
            similarity: constants::DEFAULT_SIMILARITY_THRESHOLD,
            early_stop: constants::DEFAULT_EARLY_STOP_THRESHOLD,
            reconstruction: constants::DEFAULT_RECONSTRUCTION_THRESHOLD,
            pattern: constants::DEFAULT_PATTERN_THRESHOLD,
        }
    }
}

impl AttackThresholds {
    /// Load overrides from `VECTORSCOPE_THRESHOLD_*`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            similarity: env_parse("VECTORSCOPE_THRESHOLD_SIMILARITY", defaults.similarity),
            early_stop: env_parse("VECTORSCOPE_THRESHOLD_EARLY_STOP", defaults.early_stop),
            reconstruction: env_parse("VECTORSCOPE_THRESHOLD_RECONSTRUCTION", defaults.reconstruction),
            pattern: env_parse("VECTORSCOPE_THRESHOLD_PATTERN", defaults.pattern),
        }
    }
}

// ============================================================================
// EMBEDDING BACKEND
// ============================================================================

/// Which embedding function backs the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Local deterministic feature-hashing embedder
    Hashing { dimension: usize },
    /// OpenAI-compatible `/v1/embeddings` endpoint, at most `batch_size` inputs per request
    Remote { url: String, model: String, batch_size: usize },
}

impl EmbeddingBackend {
    pub fn from_env() -> Self {
        match constants::get_embedding_backend().to_lowercase().as_str() {
            "remote" => EmbeddingBackend::Remote {
                url: constants::get_remote_url(),
                model: constants::get_remote_model(),
                batch_size: constants::get_remote_batch_size(),
            },
            other => {
                if other != "hashing" {
                    log::warn!("Unknown embedding backend '{}', using hashing", other);
                }
                EmbeddingBackend::Hashing {
                    dimension: constants::get_hashing_dimension(),
                }
            }
        }
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite file of the vector collection
    pub db_path: PathBuf,

    /// Embedding function
    pub backend: EmbeddingBackend,

    /// Seed of every random generator the attacks use
    pub seed: u64,

    pub thresholds: AttackThresholds,

    /// Default similarity attack sample size
    pub sample_size: usize,

    /// Sample sizes of the incremental similarity search
    pub incremental_schedule: Vec<usize>,

    /// Maximum incremental rounds
    pub max_rounds: usize,

    /// Default reconstruction beam width
    pub beam_width: usize,

    /// Synthetic samples per pattern centroid
    pub centroid_samples: usize,

    /// Attack audit log directory
    pub audit_dir: PathBuf,

    pub audit_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: constants::get_data_dir().join(constants::DEFAULT_DB_FILE),
            backend: EmbeddingBackend::Hashing {
                dimension: constants::DEFAULT_HASHING_DIMENSION,
            },
            seed: constants::DEFAULT_SEED,
            thresholds: AttackThresholds::default(),
            sample_size: constants::DEFAULT_SAMPLE_SIZE,
            incremental_schedule: constants::DEFAULT_INCREMENTAL_SCHEDULE.to_vec(),
            max_rounds: constants::DEFAULT_MAX_ROUNDS,
            beam_width: constants::DEFAULT_BEAM_WIDTH,
            centroid_samples: constants::DEFAULT_CENTROID_SAMPLES,
            audit_dir: constants::get_data_dir().join("audit"),
            audit_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            db_path: constants::get_db_path(),
            backend: EmbeddingBackend::from_env(),
            seed: constants::get_seed(),
            thresholds: AttackThresholds::from_env(),
            sample_size: env_parse("VECTORSCOPE_SAMPLE_SIZE", constants::DEFAULT_SAMPLE_SIZE),
            incremental_schedule: std::env::var("VECTORSCOPE_INCREMENTAL_SCHEDULE")
                .ok()
                .and_then(|s| parse_schedule(&s))
                .unwrap_or_else(|| constants::DEFAULT_INCREMENTAL_SCHEDULE.to_vec()),
            max_rounds: env_parse("VECTORSCOPE_MAX_ROUNDS", constants::DEFAULT_MAX_ROUNDS),
            beam_width: env_parse("VECTORSCOPE_BEAM_WIDTH", constants::DEFAULT_BEAM_WIDTH),
            centroid_samples: env_parse("VECTORSCOPE_CENTROID_SAMPLES", constants::DEFAULT_CENTROID_SAMPLES),
            audit_dir: constants::get_audit_dir(),
            audit_enabled: constants::is_audit_enabled(),
        }
    }

    /// Config for tests: small hashing embedder, audit disabled
    pub fn for_testing() -> Self {
        Self {
            backend: EmbeddingBackend::Hashing { dimension: 256 },
            audit_enabled: false,
            ..Default::default()
        }
    }
}

/// Parse "100,500,1000" into sizes; None if any entry is malformed or zero
fn parse_schedule(raw: &str) -> Option<Vec<usize>> {
    let sizes = raw
        .split(',')
        .map(|s| s.trim().parse::<usize>().ok().filter(|n| *n > 0))
        .collect::<Option<Vec<_>>>()?;
    if sizes.is_empty() {
        None
    } else {
        Some(sizes)
    }
}
