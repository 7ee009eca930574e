//! A single named TTL table with write-through persistence.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::CacheEntry;
use super::Clock;
use super::StorageBackend;
use crate::error::StorageError;

/// A string-keyed table of [`CacheEntry`] values with a fixed TTL.
///
/// Entries older than the TTL are never returned: they are dropped lazily on
/// read, and in bulk by [`sweep`](Self::sweep). Every write persists the whole
/// table to the backing store. Storage failures are logged and switch the
/// table to memory-only mode for the rest of its lifetime.
pub struct CacheTable<T> {
    name: String,
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    storage: Option<Arc<dyn StorageBackend>>,
    persist: AtomicBool,
    // Serializes snapshot writes so they land in the order they were taken.
    write_lock: Mutex<()>,
}

impl<T> CacheTable<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates an empty table that is never persisted.
    pub fn in_memory(name: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            ttl,
            clock,
            storage: None,
            persist: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// Loads a table from `storage`.
    ///
    /// Never fails: an unreadable or corrupt payload yields an empty table
    /// that will not be persisted.
    pub async fn load(
        name: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let mut table = Self::in_memory(name, ttl, clock);

        match read_stored::<T>(storage.as_ref(), &table.name).await {
            Ok(stored) => {
                let count = stored.len();
                for (key, mut entry) in stored {
                    entry.key = key.clone();
                    table.entries.insert(key, entry);
                }
                table.persist = AtomicBool::new(true);
                log::debug!("Loaded {} entries into cache table '{}'", count, table.name);
            }
            Err(err) => {
                log::warn!(
                    "Cache table '{}' could not be loaded, using an unpersisted table: {}",
                    table.name,
                    err
                );
            }
        }

        table.storage = Some(storage);
        table
    }

    /// Returns the table name (also its storage key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns `true` while writes are still being persisted.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some() && self.persist.load(Ordering::Acquire)
    }

    /// Returns the payload stored under `key` if it is still fresh.
    pub fn get(&self, key: &str) -> Option<T> {
        self.get_entry(key).map(|entry| entry.data)
    }

    /// Returns the whole entry stored under `key` if it is still fresh.
    ///
    /// A stale entry is removed and reported as a miss.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if entry.is_fresh(now, self.ttl) {
            return Some(entry.value().clone());
        }
        drop(entry);

        let ttl = self.ttl;
        if self
            .entries
            .remove_if(key, |_, entry| !entry.is_fresh(now, ttl))
            .is_some()
        {
            log::debug!("Dropped stale entry '{}' from '{}'", key, self.name);
        }
        None
    }

    /// Inserts or replaces the entry for `key`, stamped with the current
    /// time, and persists the table.
    pub async fn put(&self, key: &str, data: T) -> CacheEntry<T> {
        let entry = CacheEntry::new(key, data, self.clock.now());
        self.entries.insert(key.to_string(), entry.clone());
        self.persist().await;
        entry
    }

    /// Removes every entry whose age has reached the TTL, persisting the
    /// table if anything was removed.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_fresh(now, ttl) {
                true
            } else {
                removed += 1;
                false
            }
        });

        if removed > 0 {
            log::debug!("Swept {} stale entries from '{}'", removed, self.name);
            self.persist().await;
        }
        removed
    }

    /// Removes all entries and persists the empty table.
    pub async fn clear(&self) {
        self.entries.clear();
        self.persist().await;
    }

    /// Returns the number of entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn persist(&self) {
        let Some(storage) = &self.storage else { return };
        if !self.persist.load(Ordering::Acquire) {
            return;
        }

        let _guard = self.write_lock.lock().await;
        let snapshot: BTreeMap<String, CacheEntry<T>> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let result = match serde_json::to_string(&snapshot) {
            Ok(text) => storage.set_text(&self.name, text).await,
            Err(err) => Err(StorageError::Serialization(err)),
        };

        if let Err(err) = result {
            log::warn!(
                "Cache table '{}' could not be persisted, continuing in memory only: {}",
                self.name,
                err
            );
            self.persist.store(false, Ordering::Release);
        }
    }
}

impl<T> std::fmt::Debug for CacheTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheTable")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("persist", &self.persist.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

async fn read_stored<T: DeserializeOwned>(
    storage: &dyn StorageBackend,
    name: &str,
) -> Result<BTreeMap<String, CacheEntry<T>>, StorageError> {
    let Some(text) = storage.get_text(name).await? else {
        return Ok(BTreeMap::new());
    };
    serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
        table: name.to_string(),
        source,
    })
}
