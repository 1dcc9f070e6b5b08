//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden through a `VECTORSCOPE_*` environment variable.

use std::path::PathBuf;

/// App name
pub const APP_NAME: &str = "VectorScope";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data directory name (under the platform local data dir)
pub const DATA_DIR_NAME: &str = "vectorscope";

/// SQLite file holding the vector collection
pub const DEFAULT_DB_FILE: &str = "vector_db.sqlite3";

/// Default embedding backend ("hashing" or "remote")
pub const DEFAULT_EMBEDDING_BACKEND: &str = "hashing";

/// Default dimension of the local hashing embedder (all-MiniLM-L6-v2 size)
pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Default remote embedding endpoint (OpenAI-compatible, e.g. Ollama)
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:11434";

/// Default remote embedding model
pub const DEFAULT_REMOTE_MODEL: &str = "all-minilm";

/// Max inputs per embedding request (OpenAI caps a request at 2048)
pub const DEFAULT_REMOTE_BATCH_SIZE: usize = 2048;

/// Default RNG seed for candidate generation and mutation
pub const DEFAULT_SEED: u64 = 42;

/// Similarity attack success threshold
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.9;

/// Incremental similarity early-stop threshold
pub const DEFAULT_EARLY_STOP_THRESHOLD: f32 = 0.95;

/// Reconstruction attack success threshold
pub const DEFAULT_RECONSTRUCTION_THRESHOLD: f32 = 0.9;

/// Pattern attack success threshold
pub const DEFAULT_PATTERN_THRESHOLD: f32 = 0.8;

/// Candidates per similarity attack
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Sample sizes tried by the incremental similarity search
pub const DEFAULT_INCREMENTAL_SCHEDULE: [usize; 5] = [100, 500, 1000, 5000, 10000];

/// Maximum incremental rounds
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Beam width of the reconstruction search
pub const DEFAULT_BEAM_WIDTH: usize = 5;

/// Synthetic samples per centroid
pub const DEFAULT_CENTROID_SAMPLES: usize = 50;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Local data directory of the app
pub fn get_data_dir() -> PathBuf {
    std::env::var("VECTORSCOPE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME)
        })
}

/// Get vector database path from environment or use default
pub fn get_db_path() -> PathBuf {
    std::env::var("VECTORSCOPE_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join(DEFAULT_DB_FILE))
}

/// Get audit log directory from environment or use default
pub fn get_audit_dir() -> PathBuf {
    std::env::var("VECTORSCOPE_AUDIT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join("audit"))
}

/// Check if the attack audit log is enabled
pub fn is_audit_enabled() -> bool {
    std::env::var("VECTORSCOPE_AUDIT_ENABLED")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}

/// Get embedding backend name from environment or use default
pub fn get_embedding_backend() -> String {
    std::env::var("VECTORSCOPE_EMBEDDING_BACKEND")
        .unwrap_or_else(|_| DEFAULT_EMBEDDING_BACKEND.to_string())
}

/// Get remote embedding URL from environment or use default
pub fn get_remote_url() -> String {
    std::env::var("VECTORSCOPE_EMBEDDING_URL")
        .unwrap_or_else(|_| DEFAULT_REMOTE_URL.to_string())
}

/// Get remote embedding model from environment or use default
pub fn get_remote_model() -> String {
    std::env::var("VECTORSCOPE_EMBEDDING_MODEL")
        .unwrap_or_else(|_| DEFAULT_REMOTE_MODEL.to_string())
}

/// Get remote request batch size from environment or use default
pub fn get_remote_batch_size() -> usize {
    env_parse("VECTORSCOPE_EMBEDDING_BATCH_SIZE", DEFAULT_REMOTE_BATCH_SIZE)
}

/// Get hashing embedder dimension from environment or use default
pub fn get_hashing_dimension() -> usize {
    env_parse("VECTORSCOPE_HASHING_DIMENSION", DEFAULT_HASHING_DIMENSION)
}

/// Get RNG seed from environment or use default
pub fn get_seed() -> u64 {
    env_parse("VECTORSCOPE_SEED", DEFAULT_SEED)
}

/// Parse an env var, falling back to `default` when unset or malformed
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
