//! Persistent key-value storage.
//!
//! The cart only needs two operations from its backend: read one blob and
//! overwrite one blob. [`KeyValueStore`] is that seam.
//!
//! # Backends
//!
//! - [`MemoryStore`] - In-process map, shared between handles; survives a
//!   `CartStore` but not the process. Used by tests and ephemeral sessions.
//! - [`FileStore`] - One file per key in a directory; survives restarts.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StorageError;

/// Async string key-value storage.
///
/// No transactional guarantees are assumed: concurrent writers race and the
/// last `set` wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
