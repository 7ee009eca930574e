//! Time-boxed persistent caching
//!
//! Two independent [`CacheTable`]s make up the [`PersistentCache`]: one for
//! geocoded places keyed by address, one for full routes keyed by
//! [`CacheKey`](crate::model::CacheKey). Each table is held in memory and
//! written through to a [`StorageBackend`] as a single text payload after
//! every change.

mod clock;
mod config;
mod memory;
mod persistent;
mod sqlite;
mod table;

pub use clock::*;
pub use config::*;
pub use memory::*;
pub use persistent::*;
pub use sqlite::*;
pub use table::*;

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::StorageError;

/// A cached payload with the time it was written.
///
/// Persisted as `{ "data": ..., "timestamp": <epoch millis> }`; the key is
/// the table's map key and is not repeated in the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The key this entry is stored under.
    #[serde(skip)]
    pub key: String,
    /// The cached payload.
    pub data: T,
    /// When the entry was written.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, data: T, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            data,
            timestamp,
        }
    }

    /// Returns `true` while `now - timestamp < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        now - self.timestamp < ttl
    }

    /// Returns when this entry stops being fresh.
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        self.timestamp + ttl
    }
}

/// Durable string-keyed text store backing the cache tables.
///
/// Each cache table is stored as one value under its table name.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the text stored under `key`.
    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_text(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Deletes `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
