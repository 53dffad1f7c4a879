//! Storage module for the VneFiles client.
//!
//! This module provides SQLite-based persistence for client state and the
//! backend seam the session store persists the identity through.

mod backend;
mod database;

pub use backend::{
    BackendError, BackendResult, IdentityBackend, MemoryBackend, SqliteBackend, IDENTITY_KEY,
};
pub use database::{Database, DatabaseError, StorageResult, CURRENT_SCHEMA_VERSION};
