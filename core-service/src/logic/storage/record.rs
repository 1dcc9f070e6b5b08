use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// METADATA
// ============================================================================

/// Scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Record metadata (sorted keys for stable serialization)
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Ground truth text, always present on stored records
pub const KEY_ORIGINAL_TEXT: &str = "original_text";
/// Length of the original text in characters
pub const KEY_TEXT_LENGTH: &str = "text_length";
/// Optional free-form sample label
pub const KEY_LABEL: &str = "label";

// ============================================================================
// VECTOR RECORD
// ============================================================================

/// A stored sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl VectorRecord {
    pub fn original_text(&self) -> Option<&str> {
        self.metadata.get(KEY_ORIGINAL_TEXT).and_then(|v| v.as_str())
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.get(KEY_LABEL).and_then(|v| v.as_str())
    }

    pub fn text_length(&self) -> Option<i64> {
        self.metadata.get(KEY_TEXT_LENGTH).and_then(|v| v.as_i64())
    }
}

/// Nearest-neighbor hit: record plus cosine distance (1 - similarity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarHit {
    pub record: VectorRecord,
    pub distance: f32,
}
