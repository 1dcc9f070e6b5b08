//! Vector math - cosine similarity, norms and centroids
//!
//! Accumulation happens in f64 so that `cos(v, v)` lands on 1.0.

use ndarray::{Array2, Axis};

use crate::logic::error::{Result, VectorScopeError};

/// Norms at or below this are treated as zero
pub const NORM_EPSILON: f64 = 1e-10;

/// Cosine similarity `dot(a, b) / (|a| * |b|)`, range [-1, 1]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VectorScopeError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let (norm_a, norm_b) = (norm_a.sqrt(), norm_b.sqrt());
    if norm_a <= NORM_EPSILON || norm_b <= NORM_EPSILON {
        return Err(VectorScopeError::DegenerateVector);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32)
}

/// Component-wise mean of equally sized vectors
pub fn mean_vector(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let first = vectors
        .first()
        .ok_or_else(|| VectorScopeError::InvalidInput("cannot average zero vectors".to_string()))?;
    let dimension = first.len();

    let mut flat = Vec::with_capacity(vectors.len() * dimension);
    for v in vectors {
        if v.len() != dimension {
            return Err(VectorScopeError::DimensionMismatch {
                expected: dimension,
                actual: v.len(),
            });
        }
        flat.extend_from_slice(v);
    }

    let matrix = Array2::from_shape_vec((vectors.len(), dimension), flat)
        .map_err(|e| VectorScopeError::InvalidInput(e.to_string()))?;
    let mean = matrix
        .mean_axis(Axis(0))
        .ok_or_else(|| VectorScopeError::InvalidInput("cannot average zero vectors".to_string()))?;

    Ok(mean.to_vec())
}
