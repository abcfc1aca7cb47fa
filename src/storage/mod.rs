//! Key/value storage abstractions and implementations.
//!
//! This module provides the persistence seam consumed by the VM:
//! - the [`Database`] trait: point get/put/delete with an atomic [`commit`]
//!   flushing all staged writes (get-after-commit durability)
//! - [`memdb`]: staged in-memory implementation with restart simulation
//! - [`rocksdb`]: RocksDB-backed implementation flushing through a write batch
//! - [`chain`]: the typed chain store layered on a database
//!
//! [`commit`]: Database::commit

pub mod chain;
pub mod memdb;
pub mod rocksdb;

use thiserror::Error;

/// Errors reported by storage backends.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The backend failed to open, read, write, or flush.
    #[error("storage backend: {0}")]
    Backend(String),
    /// The database was used after being closed.
    #[error("database is closed")]
    Closed,
    /// A stored value could not be decoded as the expected type.
    #[error("corrupt value under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// A key/value store with staged writes.
///
/// Writes (`put`, `delete`) are staged and become visible to `get` on the
/// same handle immediately, but only reach durable storage on `commit`,
/// which flushes every staged write atomically. Implementations must be
/// `Send + Sync` so the handle can be shared across the node's tasks.
pub trait Database: Send + Sync {
    /// Returns the value stored under `key`, observing staged writes.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatabaseError>;

    /// Stages a write of `value` under `key`.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), DatabaseError>;

    /// Stages a deletion of `key`.
    fn delete(&mut self, key: &[u8]) -> Result<(), DatabaseError>;

    /// Atomically flushes all staged writes to durable storage.
    fn commit(&mut self) -> Result<(), DatabaseError>;

    /// Flushes and releases the backend. The handle is unusable afterwards.
    fn close(&mut self) -> Result<(), DatabaseError>;
}
