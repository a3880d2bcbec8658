//! SQLite-backed storage for notes, topics, and theology content.

pub(crate) mod annotations;
pub(crate) mod notes;
mod schema;
pub(crate) mod series;
pub(crate) mod systematic;
pub(crate) mod tag_types;
pub(crate) mod topics;
mod transaction;

pub use schema::{create_schema, get_schema_version, rebuild_fts};
pub use transaction::Transaction;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A mutation would violate a structural rule (self-parent, cycle,
    /// reference to a missing parent or tag).
    #[error("invalid relationship: {0}")]
    InvalidRelationship(String),

    /// A stored value could not be decoded back into its domain type.
    #[error("invalid stored data: {0}")]
    InvalidData(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Handle over the SQLite database.
///
/// Every engine component takes the store as an explicit dependency, so
/// tests can run against an in-memory store of their own.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Opens an in-memory store with the full schema.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens or creates a store at the given path.
    ///
    /// Creates parent directories if they don't exist. Initializes the
    /// schema if this is a new database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begins a transaction.
    ///
    /// The transaction rolls back automatically on drop unless `commit()`
    /// is called.
    pub fn transaction(&mut self) -> StoreResult<Transaction<'_>> {
        self.conn.execute_batch("BEGIN")?;
        Ok(Transaction::new(&self.conn))
    }
}

/// Parses an RFC 3339 timestamp column.
pub(crate) fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("invalid timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_schema() {
        let store = Store::open_in_memory().unwrap();
        let version = get_schema_version(store.conn()).unwrap();
        assert!(version >= 1);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("study.db");
        let store = Store::open(&path).unwrap();
        drop(store);
        assert!(path.exists());
    }

    #[test]
    fn transaction_rolls_back_on_drop() {
        let mut store = Store::open_in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            tx.execute(
                "INSERT INTO series (id, name, created) VALUES (?, ?, ?)",
                rusqlite::params![
                    "01HQ3K5M7NXJK4QZPW8V2R6T9Y",
                    "Romans",
                    "2024-01-15T10:30:00Z"
                ],
            )
            .unwrap();
            // dropped without commit
        }
        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM series", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn not_found_error_names_kind_and_id() {
        let err = StoreError::NotFound {
            kind: "topic",
            id: "01HQ3K5M7NXJK4QZPW8V2R6T9Y".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("topic not found"));
        assert!(msg.contains("01HQ3K5M7NXJK4QZPW8V2R6T9Y"));
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("2024-01-15T10:30:00Z").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
