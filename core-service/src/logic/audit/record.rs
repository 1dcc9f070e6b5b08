use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::attacks::{AttackResult, Evaluation};

/// One attack run, as written to the audit log
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,

    // Target
    pub vector_id: Option<String>,
    pub data_type: String,

    // Outcome
    pub method: String,
    pub success: bool,
    pub confidence: f32,
    pub num_queries: usize,
    pub time_seconds: f64,

    // Ground truth comparison (only when the original text is known)
    pub exact_match: Option<bool>,
    pub partial_accuracy: Option<f64>,
}

impl AuditRecord {
    pub fn from_result(
        vector_id: Option<&str>,
        data_type: &str,
        result: &AttackResult,
        evaluation: Option<&Evaluation>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            vector_id: vector_id.map(str::to_string),
            data_type: data_type.to_string(),
            method: result.method.clone(),
            success: result.success,
            confidence: result.confidence,
            num_queries: result.num_queries,
            time_seconds: result.time_seconds,
            exact_match: evaluation.map(|e| e.exact_match),
            partial_accuracy: evaluation.map(|e| e.partial_accuracy),
        }
    }
}
