//! Cache configuration

use std::time::Duration;

/// Default time-to-live for cached routes and places: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for cache TTL (time-to-live).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use route_cache::cache::CacheConfig;
///
/// let config = CacheConfig::default().with_ttl(Duration::from_secs(3600));
/// assert_eq!(config.ttl, Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry stays fresh after it was written.
    ///
    /// Default: 24 hours
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Creates a config under which nothing is ever served from cache.
    pub fn no_cache() -> Self {
        Self { ttl: Duration::ZERO }
    }
}
