//! Routing provider error types

use super::ThrottleError;

/// Normalized failures of a [`RouteProvider`](crate::provider::RouteProvider).
///
/// Providers map their own wire-level status codes onto these variants so
/// that the [`RouteClient`](crate::RouteClient) can classify them without
/// knowing anything about the transport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The request was understood but nothing matched (no drivable route,
    /// no geocoding result).
    #[error("no results")]
    ZeroResults,

    /// At least one of the addresses in the request could not be located.
    #[error("address not found")]
    NotFound,

    /// The provider's quota or rate limit is exhausted.
    #[error("over query limit: {0}")]
    OverQueryLimit(String),

    /// The provider refused the request (bad key, disabled API).
    #[error("request denied: {0}")]
    RequestDenied(String),

    /// The request was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success HTTP status from the provider.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Transport failure while talking to the provider.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with something we could not decode.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Any other provider-side failure.
    #[error("provider error: {0}")]
    Unknown(String),

    /// The request never reached the provider, or never finished, because of
    /// the throttle.
    #[error(transparent)]
    Throttle(#[from] ThrottleError),
}

impl ProviderError {
    /// Returns `true` if the provider understood the request but found
    /// nothing for it.
    ///
    /// `NotFound` is not an empty result: an address could not be located.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::ZeroResults)
    }

    /// Returns `true` if this error signals quota or rate exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::OverQueryLimit(_) | Self::Http { status: 429, .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_zero_results_is_empty() {
        assert!(ProviderError::ZeroResults.is_empty_result());
        assert!(!ProviderError::NotFound.is_empty_result());
        assert!(!ProviderError::Network("reset".into()).is_empty_result());
    }
}
