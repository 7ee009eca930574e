//! External routing provider abstraction
//!
//! The [`RouteProvider`] trait is the only seam between this crate and the
//! outside world. Implementations translate their transport and wire format
//! into the normalized shapes below and map failures onto
//! [`ProviderError`].

mod google;

pub use google::*;

use async_trait::async_trait;

use crate::error::ProviderError;

/// A directions/geocoding service.
///
/// Implementations must be cheap to share; the [`RouteClient`](crate::RouteClient)
/// holds one behind an `Arc` and calls it from inside the request throttle.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Computes driving routes from `origin` to `destination` via `waypoints`.
    ///
    /// An explicit "no feasible route" answer may be reported either as
    /// `Ok` with no routes or as [`ProviderError::ZeroResults`].
    async fn route_between(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
        optimize_waypoints: bool,
    ) -> Result<DirectionsResponse, ProviderError>;

    /// Resolves a free-text address.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, ProviderError>;
}

/// Successful directions answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionsResponse {
    /// Candidate routes, best first. May be empty.
    pub routes: Vec<ProviderRoute>,
}

/// One candidate route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRoute {
    /// Legs between consecutive points (origin, waypoints, destination).
    pub legs: Vec<RouteLeg>,
    /// Visiting order of the waypoints, as indices into the request's
    /// waypoint list.
    pub waypoint_order: Vec<usize>,
    /// Encoded overview polyline.
    pub polyline: String,
}

/// Distance and duration of a single leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteLeg {
    /// Leg distance in meters.
    pub distance_meters: u64,
    /// Leg duration in seconds.
    pub duration_seconds: u64,
}

/// One geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    /// Normalized address.
    pub formatted_address: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Provider place identifier.
    pub place_id: String,
    /// Provider place types (e.g. `airport`, `locality`).
    pub types: Vec<String>,
    /// ISO 3166-1 alpha-2 country code, if the provider reported one.
    pub country_code: Option<String>,
}
