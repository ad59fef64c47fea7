//! In-process storage backend.

use async_trait::async_trait;
use moka::future::Cache;

use super::KeyValueStore;
use crate::error::StorageError;

/// In-memory key-value store backed by a `moka` cache.
///
/// No capacity limit and no TTL, so entries stay until overwritten. Clones
/// share the same entries, which lets a test write through one `CartStore`
/// and hydrate another from the same data.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Cache<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Create a store pre-populated with one entry.
    pub async fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.insert(key.into(), value.into()).await;
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .insert(key.to_string(), value.to_string())
            .await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::with_entry("k", "v").await;
        let other = store.clone();
        other.set("k", "changed").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("changed"));
    }
}
