//! SQLite Collection - persistent vector records
//!
//! Append-only table of records ordered by insertion (`seq`), plus a small
//! key/value table remembering which embedding model and dimension the
//! collection was built with. Embeddings are little-endian f32 BLOBs.

use std::path::Path;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::record::{Metadata, VectorRecord};
use crate::logic::error::{Result, VectorScopeError};

// ============================================================================
// SCHEMA
// ============================================================================

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS collection_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vectors (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
"#;

pub const META_DIMENSION: &str = "embedding_dimension";
pub const META_MODEL: &str = "embedding_model";

/// Raw row before decoding
type RawRow = (String, i64, Vec<u8>, String, i64);

const SELECT_COLUMNS: &str = "SELECT id, dimension, embedding, metadata, created_at FROM vectors";

// ============================================================================
// COLLECTION
// ============================================================================

/// Persistent collection of vector records
pub struct SqliteCollection {
    conn: Mutex<Connection>,
}

impl SqliteCollection {
    /// Open (or create) a collection file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Volatile collection (tests, one-shot experiments)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM collection_meta WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO collection_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn insert(&self, record: &VectorRecord) -> Result<()> {
        let metadata = serde_json::to_string(&record.metadata)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO vectors (id, dimension, embedding, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.embedding.len() as i64,
                encode_embedding(&record.embedding),
                metadata,
                record.created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<VectorRecord>> {
        let raw = {
            let conn = self.conn.lock();
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                read_row,
            )
            .optional()?
        };
        raw.map(decode_row).transpose()
    }

    /// All records in insertion order
    pub fn all(&self) -> Result<Vec<VectorRecord>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&format!("{} ORDER BY seq ASC", SELECT_COLUMNS))?;
            let rows = stmt
                .query_map([], read_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(decode_row).collect()
    }

    /// Most recently inserted record
    pub fn latest(&self) -> Result<Option<VectorRecord>> {
        let raw = {
            let conn = self.conn.lock();
            conn.query_row(
                &format!("{} ORDER BY seq DESC LIMIT 1", SELECT_COLUMNS),
                [],
                read_row,
            )
            .optional()?
        };
        raw.map(decode_row).transpose()
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Delete every record (collection meta is kept)
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM vectors", [])?;
        Ok(())
    }
}

// ============================================================================
// ROW CODEC
// ============================================================================

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode_row((id, dimension, blob, metadata, created_at): RawRow) -> Result<VectorRecord> {
    let embedding = decode_embedding(&blob, dimension.max(0) as usize)?;
    let metadata: Metadata = serde_json::from_str(&metadata)?;
    let created_at = Utc.timestamp_millis_opt(created_at).single().unwrap_or_default();

    Ok(VectorRecord {
        id,
        embedding,
        metadata,
        created_at,
    })
}

pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(vector));
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

pub fn decode_embedding(blob: &[u8], dimension: usize) -> Result<Vec<f32>> {
    let expected_len = dimension * std::mem::size_of::<f32>();
    if blob.len() != expected_len {
        return Err(VectorScopeError::DimensionMismatch {
            expected: dimension,
            actual: blob.len() / std::mem::size_of::<f32>(),
        });
    }

    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
