//! In-memory storage backend using DashMap

use async_trait::async_trait;
use dashmap::DashMap;

use super::StorageBackend;
use crate::error::StorageError;

/// A [`StorageBackend`] that keeps everything in a concurrent hash map.
///
/// Nothing survives the process. Useful for tests, and for sharing a
/// "durable" store between several cache instances in one process.
///
/// # Example
///
/// ```
/// use route_cache::cache::MemoryStorage;
///
/// let storage = MemoryStorage::new();
/// assert!(storage.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: DashMap<String, String>,
}

impl MemoryStorage {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(key).map(|value| value.clone()))
    }

    async fn set_text(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key);
        Ok(())
    }
}
