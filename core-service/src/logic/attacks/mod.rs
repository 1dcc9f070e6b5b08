//! Attacks Module - embedding inversion attacks
//!
//! Given only a target embedding (and query access to the same embedding
//! function), recover the text or its category.
//!
//! ## Structure
//! - `template`: known data formats (SSN, credit card) + reconstruction segments
//! - `candidates`: seeded, prefix-stable candidate pool
//! - `similarity`: brute-force candidate scoring (+ incremental rounds)
//! - `reconstruction`: segment-wise greedy beam search
//! - `pattern`: centroid classification
//! - `result`: AttackResult + ground-truth evaluation
//!
//! ## Usage
//! ```ignore
//! let attack = Attack::build(AttackKind::Similarity, store.clone(), templates.clone(), &config)?;
//! let result = attack.execute(&target, &AttackOptions::for_type("ssn"))?;
//! let eval = attack.evaluate(result.extracted_text.as_deref().unwrap_or(""), truth);
//! ```

pub mod candidates;
pub mod pattern;
pub mod reconstruction;
pub mod result;
pub mod similarity;
pub mod template;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::config::EngineConfig;
use super::error::{Result, VectorScopeError};
use super::storage::VectorStore;

pub use candidates::CandidatePool;
pub use pattern::{Centroid, PatternAttack, PATTERN_METHOD};
pub use reconstruction::{ReconstructionAttack, RECONSTRUCTION_METHOD};
pub use result::{evaluate, AttackResult, Evaluation};
pub use similarity::{SimilarityAttack, INCREMENTAL_METHOD, SIMILARITY_METHOD};
pub use template::{CardIssuer, DataTemplate, Piece, Segment, TemplateRegistry};

// ============================================================================
// ATTACK SELECTION
// ============================================================================

/// Attack tag as selected by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackKind {
    Similarity,
    Incremental,
    Reconstruction,
    Pattern,
}

impl AttackKind {
    pub const ALL: [AttackKind; 4] = [
        AttackKind::Similarity,
        AttackKind::Incremental,
        AttackKind::Reconstruction,
        AttackKind::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::Similarity => "similarity",
            AttackKind::Incremental => "incremental",
            AttackKind::Reconstruction => "reconstruction",
            AttackKind::Pattern => "pattern",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackKind {
    type Err = VectorScopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "similarity" => Ok(AttackKind::Similarity),
            "incremental" => Ok(AttackKind::Incremental),
            "reconstruction" => Ok(AttackKind::Reconstruction),
            "pattern" => Ok(AttackKind::Pattern),
            other => Err(VectorScopeError::InvalidInput(format!("unknown attack method: {}", other))),
        }
    }
}

/// Per-call parameters; `None` falls back to the configured default
#[derive(Debug, Clone)]
pub struct AttackOptions {
    pub data_type: String,
    pub sample_size: Option<usize>,
    pub beam_width: Option<usize>,
    /// Similarity only: run the growing-sample schedule
    pub incremental: bool,
    pub max_rounds: Option<usize>,
}

impl AttackOptions {
    pub fn for_type(data_type: &str) -> Self {
        Self {
            data_type: data_type.to_string(),
            ..Self::default()
        }
    }
}

impl Default for AttackOptions {
    fn default() -> Self {
        Self {
            data_type: "ssn".to_string(),
            sample_size: None,
            beam_width: None,
            incremental: false,
            max_rounds: None,
        }
    }
}

// ============================================================================
// ATTACK
// ============================================================================

/// Closed set of attack strategies
pub enum Attack {
    Similarity(SimilarityAttack),
    Reconstruction(ReconstructionAttack),
    Pattern(PatternAttack),
}

impl Attack {
    /// Construct the attack behind `kind` (Pattern precomputes its centroids here)
    pub fn build(
        kind: AttackKind,
        store: Arc<VectorStore>,
        templates: Arc<TemplateRegistry>,
        config: &EngineConfig,
    ) -> Result<Self> {
        Ok(match kind {
            AttackKind::Similarity | AttackKind::Incremental => {
                Attack::Similarity(SimilarityAttack::new(store, templates, config))
            }
            AttackKind::Reconstruction => {
                Attack::Reconstruction(ReconstructionAttack::new(store, templates, config))
            }
            AttackKind::Pattern => Attack::Pattern(PatternAttack::new(store, &templates, config)?),
        })
    }

    /// Method name reported in results (non-incremental form)
    pub fn name(&self) -> &'static str {
        match self {
            Attack::Similarity(_) => SIMILARITY_METHOD,
            Attack::Reconstruction(_) => RECONSTRUCTION_METHOD,
            Attack::Pattern(_) => PATTERN_METHOD,
        }
    }

    pub fn execute(&self, target: &[f32], options: &AttackOptions) -> Result<AttackResult> {
        match self {
            Attack::Similarity(attack) => {
                if options.incremental {
                    let rounds = options.max_rounds.unwrap_or_else(|| attack.default_max_rounds());
                    attack.incremental_search(target, &options.data_type, rounds)
                } else {
                    let size = options.sample_size.unwrap_or_else(|| attack.default_sample_size());
                    attack.execute(target, &options.data_type, size)
                }
            }
            Attack::Reconstruction(attack) => {
                let width = options.beam_width.unwrap_or_else(|| attack.default_beam_width());
                attack.execute(target, &options.data_type, width)
            }
            Attack::Pattern(attack) => attack.execute(target),
        }
    }

    /// Compare an extracted string against ground truth
    pub fn evaluate(&self, extracted: &str, ground_truth: &str) -> Evaluation {
        evaluate(extracted, ground_truth)
    }
}

/// Options for running `kind` (sets the incremental flag)
pub fn options_for(kind: AttackKind, base: &AttackOptions) -> AttackOptions {
    AttackOptions {
        incremental: kind == AttackKind::Incremental,
        ..base.clone()
    }
}
