use std::fs;

use serde_json::Map;
use tempfile::tempdir;

use super::*;
use crate::logic::attacks::{evaluate, AttackResult};
use crate::logic::config::EngineConfig;

fn sample_result() -> AttackResult {
    AttackResult {
        success: true,
        extracted_text: Some("SSN: 123-45-6789".to_string()),
        confidence: 0.97,
        method: "Similarity Attack".to_string(),
        num_queries: 1000,
        time_seconds: 1.25,
        metadata: Map::new(),
    }
}

fn jsonl_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |e| e == "jsonl"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_audit_append_and_read() {
    let dir = tempdir().unwrap();
    let writer = AuditWriter::from_path(dir.path().to_path_buf()).unwrap();

    let result = sample_result();
    let eval = evaluate("SSN: 123-45-6789", "SSN: 123-45-6789");
    let record = AuditRecord::from_result(Some("abc"), "ssn", &result, Some(&eval));
    writer.append(&record).unwrap();

    let files = jsonl_files(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("audit-"));

    let content = fs::read_to_string(&files[0]).unwrap();
    let deserialized: AuditRecord = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(deserialized, record);
    assert_eq!(deserialized.exact_match, Some(true));
    assert_eq!(deserialized.num_queries, 1000);
}

#[test]
fn test_appends_to_same_file() {
    let dir = tempdir().unwrap();
    let writer = AuditWriter::from_path(dir.path().to_path_buf()).unwrap();
    let record = AuditRecord::from_result(None, "ssn", &sample_result(), None);

    for _ in 0..3 {
        writer.append(&record).unwrap();
    }

    assert_eq!(jsonl_files(dir.path()).len(), 1);
    let all = writer.read_all().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|r| r.exact_match.is_none() && r.vector_id.is_none()));
}

#[test]
fn test_rotation_creates_new_file() {
    let dir = tempdir().unwrap();
    // Tiny limit: every append after the first rotates
    let writer = AuditWriter::from_path(dir.path().to_path_buf())
        .unwrap()
        .with_max_file_size(16);
    let record = AuditRecord::from_result(Some("id"), "creditcard", &sample_result(), None);

    writer.append(&record).unwrap();
    writer.append(&record).unwrap();
    writer.append(&record).unwrap();

    assert_eq!(jsonl_files(dir.path()).len(), 3);
    assert_eq!(writer.read_all().unwrap().len(), 3);

    let (count, _size_mb, latest) = writer.get_stats().unwrap();
    assert_eq!(count, 3);
    assert!(latest.starts_with("audit-"));
}

#[test]
fn test_resumes_latest_file() {
    let dir = tempdir().unwrap();
    let record = AuditRecord::from_result(Some("id"), "ssn", &sample_result(), None);

    AuditWriter::from_path(dir.path().to_path_buf())
        .unwrap()
        .append(&record)
        .unwrap();
    AuditWriter::from_path(dir.path().to_path_buf())
        .unwrap()
        .append(&record)
        .unwrap();

    assert_eq!(jsonl_files(dir.path()).len(), 1);
}

#[test]
fn test_disabled_audit() {
    let config = EngineConfig::for_testing();
    assert!(from_config(&config).unwrap().is_none());

    let dir = tempdir().unwrap();
    let config = EngineConfig {
        audit_enabled: true,
        audit_dir: dir.path().join("audit"),
        ..EngineConfig::for_testing()
    };
    let writer = from_config(&config).unwrap().unwrap();
    assert!(writer.base_dir().exists());
}
