//! Attack Result - uniform outcome record + ground-truth evaluation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one attack execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackResult {
    /// Confidence exceeded the attack's threshold
    pub success: bool,
    pub extracted_text: Option<String>,
    /// Best cosine similarity, reported in [0, 1]
    pub confidence: f32,
    pub method: String,
    /// Embedding evaluations spent
    pub num_queries: usize,
    pub time_seconds: f64,
    /// Method specific details
    pub metadata: Map<String, Value>,
}

impl AttackResult {
    /// Raw (unclamped) best similarity, falls back to `confidence`
    pub fn raw_similarity(&self) -> f64 {
        self.metadata
            .get(KEY_RAW_SIMILARITY)
            .and_then(Value::as_f64)
            .unwrap_or(f64::from(self.confidence))
    }
}

impl fmt::Display for AttackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Attack Result:")?;
        writeln!(f, "  Method: {}", self.method)?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Extracted: {}", self.extracted_text.as_deref().unwrap_or("None"))?;
        writeln!(f, "  Confidence: {:.2}%", self.confidence * 100.0)?;
        writeln!(f, "  Queries: {}", self.num_queries)?;
        write!(f, "  Time: {:.2}s", self.time_seconds)
    }
}

pub const KEY_RAW_SIMILARITY: &str = "raw_similarity";

/// Similarity -> reported confidence. Negative similarities read as 0.
pub(crate) fn to_confidence(similarity: f32) -> f32 {
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(0.0, 1.0)
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Comparison of an extracted string against ground truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub exact_match: bool,
    /// Fraction of ground-truth alphanumerics recovered at the same position
    pub partial_accuracy: f64,
    pub extracted: String,
    pub ground_truth: String,
}

/// Exact comparison + position-wise accuracy over alphanumeric characters
pub fn evaluate(extracted: &str, ground_truth: &str) -> Evaluation {
    let exact_match = extracted == ground_truth;

    let clean_extracted: Vec<char> = extracted.chars().filter(|c| c.is_alphanumeric()).collect();
    let clean_truth: Vec<char> = ground_truth.chars().filter(|c| c.is_alphanumeric()).collect();

    let partial_accuracy = if clean_truth.is_empty() {
        0.0
    } else {
        let matches = clean_extracted
            .iter()
            .zip(clean_truth.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / clean_truth.len() as f64
    };

    Evaluation {
        exact_match,
        partial_accuracy,
        extracted: extracted.to_string(),
        ground_truth: ground_truth.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let eval = evaluate("SSN: 123-45-6789", "SSN: 123-45-6789");
        assert!(eval.exact_match);
        assert_eq!(eval.partial_accuracy, 1.0);
    }

    #[test]
    fn test_partial_accuracy() {
        // 12 alphanumerics in truth, last digit differs
        let eval = evaluate("SSN: 123-45-6788", "SSN: 123-45-6789");
        assert!(!eval.exact_match);
        assert!((eval.partial_accuracy - 11.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_template_against_truth() {
        // Only "SSN" survives: 3 of 12 alphanumerics
        let eval = evaluate("SSN: 000-00-0000", "SSN: 123-45-6789");
        assert!(!eval.exact_match);
        assert_eq!(eval.partial_accuracy, 0.25);
    }

    #[test]
    fn test_separators_are_ignored() {
        let eval = evaluate("SSN 123 45 6789", "SSN: 123-45-6789");
        assert!(!eval.exact_match);
        assert_eq!(eval.partial_accuracy, 1.0);
    }

    #[test]
    fn test_shorter_extraction() {
        let eval = evaluate("SSN", "SSN: 123-45-6789");
        assert!((eval.partial_accuracy - 3.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_truth() {
        assert_eq!(evaluate("anything", "").partial_accuracy, 0.0);
        assert_eq!(evaluate("abc", "---").partial_accuracy, 0.0);
    }

    #[test]
    fn test_confidence_clamp() {
        assert_eq!(to_confidence(-0.4), 0.0);
        assert_eq!(to_confidence(0.42), 0.42);
        assert_eq!(to_confidence(1.0000001), 1.0);
        assert_eq!(to_confidence(f32::NAN), 0.0);
    }

    #[test]
    fn test_display_block() {
        let result = AttackResult {
            success: true,
            extracted_text: Some("SSN: 123-45-6789".to_string()),
            confidence: 0.9812,
            method: "Similarity Attack".to_string(),
            num_queries: 1000,
            time_seconds: 0.5,
            metadata: Map::new(),
        };
        let text = result.to_string();
        assert!(text.contains("Method: Similarity Attack"));
        assert!(text.contains("Confidence: 98.12%"));
        assert!(text.contains("Queries: 1000"));

        let empty = AttackResult {
            extracted_text: None,
            ..result
        };
        assert!(empty.to_string().contains("Extracted: None"));
    }
}
