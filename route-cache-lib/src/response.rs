//! Response wrapper with cache status

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

use crate::cache::CacheEntry;

/// A value returned by the [`RouteClient`](crate::RouteClient) together with
/// where it came from.
///
/// # Example
///
/// ```ignore
/// let response = client.resolve_route(&request).await;
///
/// if response.is_cached() {
///     println!("served from cache, written at {:?}", response.cached_at());
/// }
///
/// let outcome = response.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Information about whether this response came from cache.
    pub cache: CacheStatus,
}

impl<T> Response<T> {
    /// Creates a response that involved no cache (a short-circuit, or an
    /// uncacheable answer such as a failure).
    pub fn new(data: T) -> Self {
        Self {
            data,
            cache: CacheStatus::None,
        }
    }

    /// Creates a response for a fresh provider answer that has been cached.
    pub fn stored<U>(data: T, entry: &CacheEntry<U>, ttl: Duration) -> Self {
        Self {
            data,
            cache: CacheStatus::Miss {
                cached_at: entry.timestamp,
                expires_at: entry.expires_at(ttl),
            },
        }
    }

    /// Creates a response for a cache hit.
    pub fn hit<U>(data: T, entry: &CacheEntry<U>, ttl: Duration) -> Self {
        Self {
            data,
            cache: CacheStatus::Hit {
                cached_at: entry.timestamp,
                expires_at: entry.expires_at(ttl),
            },
        }
    }

    /// Returns `true` if this response came from the cache.
    pub fn is_cached(&self) -> bool {
        self.cache.is_hit()
    }

    /// Returns when the data was cached, if applicable.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        match &self.cache {
            CacheStatus::None => None,
            CacheStatus::Miss { cached_at, .. } | CacheStatus::Hit { cached_at, .. } => {
                Some(*cached_at)
            }
        }
    }

    /// Returns when the cached data expires, if applicable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.cache {
            CacheStatus::None => None,
            CacheStatus::Miss { expires_at, .. } | CacheStatus::Hit { expires_at, .. } => {
                Some(*expires_at)
            }
        }
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the inner data, keeping the cache status.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            cache: self.cache,
        }
    }
}

/// Cache status for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache was not involved.
    None,
    /// Fetched from the provider and now cached.
    Miss {
        /// When the data was cached.
        cached_at: DateTime<Utc>,
        /// When the cached data will expire.
        expires_at: DateTime<Utc>,
    },
    /// Returned from the cache without a provider call.
    Hit {
        /// When the data was originally cached.
        cached_at: DateTime<Utc>,
        /// When the cached data will expire.
        expires_at: DateTime<Utc>,
    },
}

impl CacheStatus {
    /// Returns `true` if this is a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns `true` if this is a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }

    /// Returns `true` if caching was not involved.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
