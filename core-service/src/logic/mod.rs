//! Logic Module - Engine & Attacks
//!
//! Chứa các thành phần: Vector Store, Embedding backends, Attacks, Audit log.
//!
//! ## Architecture
//! - `embedding/` - Embedding function backends (hashing, remote HTTP)
//! - `storage/` - Vector store (SQLite collection, cosine similarity)
//! - `attacks/` - Similarity, Reconstruction, Pattern attacks + evaluation
//! - `audit/` - JSONL log of attack runs

// Core
pub mod config;
pub mod error;

// Engine
pub mod embedding;
pub mod storage;
pub mod attacks;
pub mod audit;
