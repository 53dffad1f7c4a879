//! Durable slot for the serialized session identity.
//!
//! The session store talks to a [`IdentityBackend`]; the SQLite backend is
//! used by the application and the in-memory backend by tests and by
//! sessions that should not outlive the process.

use std::sync::Mutex;

use thiserror::Error;

use super::database::{Database, DatabaseError};

/// Fixed namespace key under which the identity is persisted.
pub const IDENTITY_KEY: &str = "vnefiles_user";

/// Errors that can occur in an identity backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The underlying database failed.
    #[error("identity storage error: {0}")]
    Database(#[from] DatabaseError),

    /// The backend cannot be used right now.
    #[error("identity storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for identity backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Trait for identity persistence implementations.
///
/// Values are opaque strings; encoding is the session store's concern.
pub trait IdentityBackend: Send + Sync {
    /// Read the persisted value, if any.
    fn load(&self) -> BackendResult<Option<String>>;

    /// Replace the persisted value.
    fn store(&self, value: &str) -> BackendResult<()>;

    /// Remove the persisted value. Clearing an empty slot succeeds.
    fn clear(&self) -> BackendResult<()>;
}

/// Identity backend stored in the client SQLite database.
pub struct SqliteBackend {
    db: Mutex<Database>,
    key: String,
}

impl SqliteBackend {
    /// Create a backend using the default namespace key.
    pub fn new(db: Database) -> Self {
        Self::with_key(db, IDENTITY_KEY)
    }

    /// Create a backend with a custom namespace key.
    pub fn with_key(db: Database, key: impl Into<String>) -> Self {
        Self {
            db: Mutex::new(db),
            key: key.into(),
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T, DatabaseError>) -> BackendResult<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| BackendError::Unavailable("database lock poisoned".to_string()))?;
        Ok(f(&db)?)
    }
}

impl IdentityBackend for SqliteBackend {
    fn load(&self) -> BackendResult<Option<String>> {
        self.with_db(|db| db.get_value(&self.key))
    }

    fn store(&self, value: &str) -> BackendResult<()> {
        self.with_db(|db| db.set_value(&self.key, value))
    }

    fn clear(&self) -> BackendResult<()> {
        self.with_db(|db| db.delete_value(&self.key)).map(|_| ())
    }
}

/// Identity backend that lives only as long as the process.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that already holds a value.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(value.into())),
        }
    }

    fn slot(&self) -> BackendResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.slot
            .lock()
            .map_err(|_| BackendError::Unavailable("memory slot lock poisoned".to_string()))
    }
}

impl IdentityBackend for MemoryBackend {
    fn load(&self) -> BackendResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn store(&self, value: &str) -> BackendResult<()> {
        *self.slot()? = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> BackendResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}
