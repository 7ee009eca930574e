//! Throttle configuration.

use std::time::Duration;

/// Configuration for the [`RequestThrottle`](super::RequestThrottle).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use route_cache::throttle::ThrottleConfig;
///
/// // Default: one call per second, 30 second call timeout
/// let config = ThrottleConfig::default();
/// assert_eq!(config.window, Duration::from_secs(1));
///
/// // Wait forever on a hung provider call
/// let unbounded = ThrottleConfig::unbounded();
/// assert!(unbounded.call_timeout.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum spacing between two dispatches.
    pub window: Duration,
    /// Upper bound on a single call. `None` waits indefinitely, which lets a
    /// hung call stall the whole queue.
    pub call_timeout: Option<Duration>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ThrottleConfig {
    /// Creates a config without a call timeout.
    pub fn unbounded() -> Self {
        Self {
            call_timeout: None,
            ..Default::default()
        }
    }

    /// Sets the dispatch window.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets or clears the call timeout.
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }
}
