//! The two-table route and geocode cache.

use std::sync::Arc;

use super::CacheConfig;
use super::CacheTable;
use super::Clock;
use super::StorageBackend;
use super::SystemClock;
use crate::model::PlaceInfo;
use crate::model::RouteResult;

/// Storage key of the geocode table.
pub const GEOCODE_TABLE: &str = "geocode_cache";

/// Storage key of the route table.
pub const ROUTE_TABLE: &str = "route_cache";

/// Geocode and route caches sharing one TTL, clock and storage backend.
///
/// Geocode results are keyed by address and reusable across many route
/// requests; route results are keyed by
/// [`CacheKey`](crate::model::CacheKey) and are not decomposable.
///
/// # Example
///
/// ```ignore
/// use route_cache::cache::{CacheConfig, PersistentCache, SqliteStorage};
///
/// let storage = SqliteStorage::open("route-cache.db").await?;
/// let cache = PersistentCache::open(storage, CacheConfig::default()).await;
/// ```
#[derive(Debug)]
pub struct PersistentCache {
    geocode: CacheTable<PlaceInfo>,
    routes: CacheTable<RouteResult>,
}

impl PersistentCache {
    /// Opens both tables from `storage` using the system clock, then sweeps
    /// stale entries.
    pub async fn open(storage: impl StorageBackend + 'static, config: CacheConfig) -> Self {
        Self::open_with_clock(Arc::new(storage), config, Arc::new(SystemClock)).await
    }

    /// Opens both tables with an explicit clock, then sweeps stale entries.
    pub async fn open_with_clock(
        storage: Arc<dyn StorageBackend>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Self {
            geocode: CacheTable::load(GEOCODE_TABLE, config.ttl, clock.clone(), storage.clone())
                .await,
            routes: CacheTable::load(ROUTE_TABLE, config.ttl, clock, storage).await,
        };

        let removed = cache.sweep().await;
        log::debug!(
            "Opened route cache: {} routes, {} places ({} stale removed)",
            cache.routes.len(),
            cache.geocode.len(),
            removed
        );
        cache
    }

    /// Creates an empty cache that is never persisted.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty unpersisted cache with an explicit clock.
    pub fn in_memory_with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            geocode: CacheTable::in_memory(GEOCODE_TABLE, config.ttl, clock.clone()),
            routes: CacheTable::in_memory(ROUTE_TABLE, config.ttl, clock),
        }
    }

    /// The geocode table, keyed by address.
    pub fn geocode(&self) -> &CacheTable<PlaceInfo> {
        &self.geocode
    }

    /// The route table, keyed by route cache key.
    pub fn routes(&self) -> &CacheTable<RouteResult> {
        &self.routes
    }

    /// Sweeps stale entries from both tables.
    ///
    /// Returns the total number of entries removed.
    pub async fn sweep(&self) -> usize {
        self.geocode.sweep().await + self.routes.sweep().await
    }

    /// Empties both tables.
    pub async fn clear(&self) {
        self.geocode.clear().await;
        self.routes.clear().await;
    }
}

impl Default for PersistentCache {
    fn default() -> Self {
        Self::in_memory(CacheConfig::default())
    }
}
