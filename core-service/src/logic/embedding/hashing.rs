//! Hashing Embedder - Local deterministic embedding function
//!
//! Character n-grams, word tokens and positioned characters are hashed
//! (CRC32) into a fixed number of buckets with a hashed sign, then the vector
//! is L2-normalized. Không cần model, không cần network.

use super::Embedder;
use crate::logic::error::{Result, VectorScopeError};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Longest character n-gram
const MAX_NGRAM: usize = 3;

/// Weight per n-gram length (index = n - 1)
const NGRAM_WEIGHTS: [f32; MAX_NGRAM] = [0.5, 1.0, 1.5];

const WORD_WEIGHT: f32 = 1.0;
const POSITION_WEIGHT: f32 = 0.75;

/// Initial CRC state of the sign hash (independent of the bucket hash)
const SIGN_SEED: u32 = 0x9E37_79B9;

const TEXT_START: char = '\u{2}';
const TEXT_END: char = '\u{3}';

// Feature namespaces
const NS_NGRAM: u8 = b'g';
const NS_WORD: u8 = b'w';
const NS_POSITION: u8 = b'p';

// ============================================================================
// EMBEDDER
// ============================================================================

/// Feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(VectorScopeError::InvalidInput(
                "hashing embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("hashing-ngram-{}", dimension),
        })
    }

    /// Embed a single text
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();

        let mut chars: Vec<char> = Vec::with_capacity(lowered.len() + 2);
        chars.push(TEXT_START);
        chars.extend(lowered.chars());
        chars.push(TEXT_END);

        for n in 1..=MAX_NGRAM {
            let weight = NGRAM_WEIGHTS[n - 1];
            for window in chars.windows(n) {
                let gram: String = window.iter().collect();
                self.add_feature(&mut vector, NS_NGRAM, gram.as_bytes(), weight);
            }
        }

        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.add_feature(&mut vector, NS_WORD, word.as_bytes(), WORD_WEIGHT);
        }

        // Positioned alphanumerics: same character at the same offset
        for (position, c) in lowered.chars().enumerate().filter(|(_, c)| c.is_alphanumeric()) {
            let feature = format!("{}:{}", position, c);
            self.add_feature(&mut vector, NS_POSITION, feature.as_bytes(), POSITION_WEIGHT);
        }

        normalize(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], namespace: u8, bytes: &[u8], weight: f32) {
        let mut bucket_hasher = crc32fast::Hasher::new();
        bucket_hasher.update(&[namespace]);
        bucket_hasher.update(bytes);
        let bucket = bucket_hasher.finalize() as usize % self.dimension;

        let mut sign_hasher = crc32fast::Hasher::new_with_initial(SIGN_SEED);
        sign_hasher.update(&[namespace]);
        sign_hasher.update(bytes);
        let sign = if sign_hasher.finalize() & 1 == 0 { 1.0 } else { -1.0 };

        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// L2-normalize in place; zero vectors stay zero
fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| f64::from(*v) * f64::from(*v)).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for v in vector.iter_mut() {
            *v = (f64::from(*v) / norm) as f32;
        }
    }
}
