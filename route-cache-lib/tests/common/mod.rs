//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use route_cache::RouteClient;
use route_cache::cache::CacheConfig;
use route_cache::cache::PersistentCache;
use route_cache::error::ProviderError;
use route_cache::provider::DirectionsResponse;
use route_cache::provider::GeocodeResult;
use route_cache::provider::ProviderRoute;
use route_cache::provider::RouteLeg;
use route_cache::provider::RouteProvider;
use route_cache::throttle::ThrottleConfig;
use tokio::time::Instant;

/// Distance of a direct route unless overridden.
pub const DEFAULT_DISTANCE: u64 = 57_800;

/// A provider call as seen by [`MockProvider`].
#[derive(Debug, Clone)]
pub struct RouteCall {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
    pub at: Instant,
}

/// Scripted provider keyed on destination names:
///
/// - `Nowhere` answers `ZERO_RESULTS`
/// - `Atlantis` answers `NOT_FOUND`
/// - `Island` answers OK with no routes
/// - `Busy` answers over-query-limit
/// - `Broken` fails at the transport level
/// - `Hang` takes an hour
///
/// Anything else yields one route.
#[derive(Clone, Default)]
pub struct MockProvider {
    delay: Duration,
    distances: Arc<HashMap<String, u64>>,
    route_calls: Arc<Mutex<Vec<RouteCall>>>,
    geocode_calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call takes `delay` to answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Direct routes to `destination` are `meters` long.
    pub fn with_distance(mut self, destination: &str, meters: u64) -> Self {
        let mut distances = (*self.distances).clone();
        distances.insert(destination.to_string(), meters);
        self.distances = Arc::new(distances);
        self
    }

    pub fn route_calls(&self) -> Vec<RouteCall> {
        self.route_calls.lock().unwrap().clone()
    }

    pub fn geocode_calls(&self) -> Vec<String> {
        self.geocode_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteProvider for MockProvider {
    async fn route_between(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
        _optimize_waypoints: bool,
    ) -> Result<DirectionsResponse, ProviderError> {
        self.route_calls.lock().unwrap().push(RouteCall {
            origin: origin.to_string(),
            destination: destination.to_string(),
            waypoints: waypoints.to_vec(),
            at: Instant::now(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match destination {
            "Nowhere" => return Err(ProviderError::ZeroResults),
            "Atlantis" => return Err(ProviderError::NotFound),
            "Island" => return Ok(DirectionsResponse::default()),
            "Busy" => {
                return Err(ProviderError::OverQueryLimit(
                    "You have exceeded your rate-limit".to_string(),
                ));
            }
            "Broken" => return Err(ProviderError::Network("connection reset".to_string())),
            "Hang" => tokio::time::sleep(Duration::from_secs(3600)).await,
            _ => {}
        }

        let legs = if waypoints.is_empty() {
            vec![RouteLeg {
                distance_meters: self
                    .distances
                    .get(destination)
                    .copied()
                    .unwrap_or(DEFAULT_DISTANCE),
                duration_seconds: 2_700,
            }]
        } else {
            vec![
                RouteLeg {
                    distance_meters: 10_000,
                    duration_seconds: 600,
                };
                waypoints.len() + 1
            ]
        };

        Ok(DirectionsResponse {
            routes: vec![ProviderRoute {
                legs,
                waypoint_order: (0..waypoints.len()).rev().collect(),
                polyline: format!("{}|{}", origin, destination),
            }],
        })
    }

    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, ProviderError> {
        self.geocode_calls.lock().unwrap().push(address.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match address {
            "Nowhere" => Ok(Vec::new()),
            "Busy" => Err(ProviderError::OverQueryLimit("quota".to_string())),
            _ => Ok(vec![GeocodeResult {
                formatted_address: format!("{}, somewhere", address),
                lat: 47.0,
                lng: 8.0,
                place_id: format!("place-{}", address),
                types: vec!["locality".to_string()],
                country_code: Some(if address.contains("Paris") { "FR" } else { "CH" }.to_string()),
            }]),
        }
    }
}

/// Client with an in-memory cache and the default one second throttle.
pub fn client(provider: &MockProvider) -> RouteClient {
    client_with(provider, CacheConfig::default(), ThrottleConfig::default())
}

pub fn client_with(
    provider: &MockProvider,
    cache: CacheConfig,
    throttle: ThrottleConfig,
) -> RouteClient {
    RouteClient::builder()
        .provider(provider.clone())
        .cache(PersistentCache::in_memory(cache))
        .throttle_config(throttle)
        .build()
}
