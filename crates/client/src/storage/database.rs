//! SQLite database for durable client state.
//!
//! Holds a small key/value table with schema migrations tracked through
//! `PRAGMA user_version`.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Path error.
    #[error("Invalid database path: {0}")]
    InvalidPath(String),
}

/// Result type for database operations.
pub type StorageResult<T> = Result<T, DatabaseError>;

/// Schema version written by the latest migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Database wrapper providing all storage operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    ///
    /// Missing parent directories are created and pending migrations applied.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::InvalidPath(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let mut db = Self { conn };
        db.run_migrations()?;

        tracing::debug!("Opened client database at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get the current schema version.
    pub fn get_schema_version(&self) -> StorageResult<i32> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    fn run_migrations(&mut self) -> StorageResult<()> {
        let current_version = self.get_schema_version()?;

        if current_version > CURRENT_SCHEMA_VERSION {
            return Err(DatabaseError::Migration(format!(
                "database schema version {} is newer than supported version {}",
                current_version, CURRENT_SCHEMA_VERSION
            )));
        }

        if current_version < 1 {
            self.migrate_v1()?;
        }

        Ok(())
    }

    /// Migration to version 1: client state table.
    fn migrate_v1(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        tx.execute(&format!("PRAGMA user_version = {}", 1), [])?;

        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Client state
    // =========================================================================

    /// Get a value by key.
    pub fn get_value(&self, key: &str) -> StorageResult<Option<String>> {
        let result = self
            .conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Insert or replace a value.
    pub fn set_value(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, unix_now()],
        )?;
        Ok(())
    }

    /// Delete a value. Returns whether a row was removed.
    pub fn delete_value(&self, key: &str) -> StorageResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
        Ok(rows_affected > 0)
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
