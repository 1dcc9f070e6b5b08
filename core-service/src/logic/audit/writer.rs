use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use super::record::AuditRecord;
use crate::logic::error::Result;

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

const FILE_PREFIX: &str = "audit-";
const FILE_EXTENSION: &str = "jsonl";

/// Append-only JSONL audit log with size based rotation
pub struct AuditWriter {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
    max_file_size: u64,
}

impl AuditWriter {
    pub fn from_path(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            file: Mutex::new(None),
            base_dir,
            max_file_size: MAX_FILE_SIZE,
        })
    }

    /// Rotate at `bytes` instead of 10 MB
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes.max(1);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Append one record, rotating when the current file is full
    pub fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut file_guard = self.file.lock();

        // Resume the latest file if it still has room
        if file_guard.is_none() {
            let resumed = match self.find_latest_log_file()? {
                Some(path) => {
                    let f = OpenOptions::new().create(true).append(true).open(&path)?;
                    if f.metadata()?.len() < self.max_file_size {
                        Some(f)
                    } else {
                        None
                    }
                }
                None => None,
            };
            *file_guard = Some(match resumed {
                Some(f) => f,
                None => self.create_new_file()?,
            });
        }

        let should_rotate = match file_guard.as_ref() {
            Some(f) => f.metadata()?.len() >= self.max_file_size,
            None => false,
        };
        if should_rotate {
            *file_guard = Some(self.create_new_file()?);
        }

        if let Some(file) = file_guard.as_mut() {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{}", json)?;
        }

        Ok(())
    }

    /// (file count, total size in MB, latest file name)
    pub fn get_stats(&self) -> Result<(usize, f32, String)> {
        let files = self.log_files()?;
        let size: u64 = files
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();
        let latest = files
            .last()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("None")
            .to_string();

        Ok((files.len(), size as f32 / 1024.0 / 1024.0, latest))
    }

    /// Every record in every audit file, oldest file first
    pub fn read_all(&self) -> Result<Vec<AuditRecord>> {
        let mut records = Vec::new();
        for path in self.log_files()? {
            let content = fs::read_to_string(&path)?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    fn create_new_file(&self) -> Result<File> {
        // audit-YYYYMMDD-HHMMSS-mmm-NNN.jsonl; NNN only differs within one millisecond
        let stamp = Utc::now().format("%Y%m%d-%H%M%S-%3f").to_string();
        let mut n = 0;
        let mut path;
        loop {
            path = self
                .base_dir
                .join(format!("{}{}-{:03}.{}", FILE_PREFIX, stamp, n, FILE_EXTENSION));
            if !path.exists() {
                break;
            }
            n += 1;
        }

        log::debug!("Opening audit file {:?}", path);
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    fn find_latest_log_file(&self) -> Result<Option<PathBuf>> {
        Ok(self.log_files()?.pop())
    }

    /// Audit files sorted by name (timestamp order)
    fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.base_dir)?
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == FILE_EXTENSION))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(FILE_PREFIX))
            })
            .collect::<Vec<_>>();
        entries.sort();
        Ok(entries)
    }
}
