//! Audit Module - attack run log
//!
//! Mỗi lần chạy attack ghi một dòng JSON: method, target, confidence, cost,
//! and the ground-truth comparison when the original text is known.
//! Stored as JSONL with automatic rotation.

pub mod record;
pub mod writer;

#[cfg(test)]
mod tests;

pub use record::AuditRecord;
pub use writer::AuditWriter;

use crate::logic::config::EngineConfig;
use crate::logic::error::Result;

/// Writer for the configured audit directory, None when auditing is off
pub fn from_config(config: &EngineConfig) -> Result<Option<AuditWriter>> {
    if !config.audit_enabled {
        return Ok(None);
    }
    let writer = AuditWriter::from_path(config.audit_dir.clone())?;
    log::info!("Audit logging to {:?}", writer.base_dir());
    Ok(Some(writer))
}
