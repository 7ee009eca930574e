//! Published controller state.

use std::time::Duration;

use crate::model::RouteOutcome;

/// What the UI renders: the current outcome, whether a calculation is
/// running, and a message for unsuccessful outcomes.
///
/// `result` and `error` always describe the same calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteState {
    /// Outcome for the most recent applied input, `None` until the first
    /// calculation completes.
    pub result: Option<RouteOutcome>,
    /// `true` while a calculation for the current input is in flight.
    pub is_calculating: bool,
    /// User-facing message when `result` is not a success.
    pub error: Option<String>,
}

impl RouteState {
    /// Returns the distance in meters of a successful result.
    pub fn distance_meters(&self) -> Option<u64> {
        self.result
            .as_ref()
            .and_then(RouteOutcome::route)
            .map(|route| route.distance_meters)
    }
}

/// Configuration for the [`RouteCalculationController`](super::RouteCalculationController).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Quiet period after the last input change before calculating.
    ///
    /// Default: 500 ms
    pub debounce: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

impl ControllerConfig {
    /// Sets the debounce period.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}
