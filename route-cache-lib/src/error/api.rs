//! Client-facing error classification

use std::time::Duration;

use super::ProviderError;
use super::ThrottleError;

/// Classified failure returned by the [`RouteClient`](crate::RouteClient).
///
/// This is the payload of [`RouteOutcome::ApiError`](crate::model::RouteOutcome)
/// and the error side of place resolution. It is `Clone` so it can travel
/// through the controller's watch channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The provider rejected the call because its quota is exhausted.
    ///
    /// Callers should present "try again shortly" messaging.
    #[error("The routing service is busy, please try again shortly ({message})")]
    RateLimited {
        /// Provider-supplied detail.
        message: String,
    },

    /// The provider found nothing for the given address.
    #[error("No results for '{query}'")]
    NoResults {
        /// The address or request that produced no results.
        query: String,
    },

    /// Transport, authorization or malformed-response failure.
    #[error("Routing service error: {message}")]
    Provider {
        /// The underlying error message.
        message: String,
    },

    /// The provider call did not complete within the call timeout.
    #[error("Routing service timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Creates a generic provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Returns `true` if the failure is due to quota exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` if retrying later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_))
    }

    /// Classifies a provider failure.
    ///
    /// `query` names the request for the `NoResults` message.
    pub fn classify(err: ProviderError, query: &str) -> Self {
        match err {
            err if err.is_rate_limited() => Self::RateLimited {
                message: err.to_string(),
            },
            ProviderError::ZeroResults | ProviderError::NotFound => Self::NoResults {
                query: query.to_string(),
            },
            ProviderError::Throttle(ThrottleError::TimedOut(after)) => Self::Timeout(after),
            other => Self::Provider {
                message: other.to_string(),
            },
        }
    }
}
