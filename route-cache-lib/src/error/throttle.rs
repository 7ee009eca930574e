//! Request throttle error types

use std::time::Duration;

/// Errors produced by the [`RequestThrottle`](crate::throttle::RequestThrottle)
/// itself, as opposed to errors returned by the unit of work it runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThrottleError {
    /// The queue worker has shut down and no longer accepts work.
    #[error("request throttle is closed")]
    Closed,

    /// The unit did not complete within the configured call timeout.
    #[error("call timed out after {0:?}")]
    TimedOut(Duration),

    /// The unit panicked while executing.
    #[error("call panicked")]
    Panicked,
}
