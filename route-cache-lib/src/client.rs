//! Main RouteClient

use std::sync::Arc;

use crate::cache::PersistentCache;
use crate::error::ApiError;
use crate::error::ProviderError;
use crate::error::ThrottleError;
use crate::model::CacheKey;
use crate::model::PlaceInfo;
use crate::model::RouteOutcome;
use crate::model::RouteRequest;
use crate::model::RouteResult;
use crate::provider::RouteProvider;
use crate::response::Response;
use crate::throttle::RequestThrottle;
use crate::throttle::ThrottleConfig;

/// The only component that talks to the routing provider.
///
/// Every lookup consults the [`PersistentCache`] first; misses are funneled
/// through the shared [`RequestThrottle`]. Provider failures never escape:
/// they are classified into [`RouteOutcome`] values (or [`ApiError`] for
/// place lookups).
///
/// Cheap to clone (uses `Arc` internally). Build one per process and hand
/// clones to every controller so they share one cache and one throttle.
///
/// # Example
///
/// ```ignore
/// use route_cache::RouteClient;
/// use route_cache::model::RouteRequest;
///
/// let client = RouteClient::builder()
///     .provider(provider)
///     .cache(cache)
///     .build();
///
/// let outcome = client
///     .resolve_route(&RouteRequest::new("Zurich Airport", "Lucerne"))
///     .await
///     .into_inner();
/// ```
#[derive(Clone)]
pub struct RouteClient {
    inner: Arc<RouteClientInner>,
}

struct RouteClientInner {
    provider: Arc<dyn RouteProvider>,
    cache: Arc<PersistentCache>,
    throttle: RequestThrottle,
    config: ClientConfig,
}

impl RouteClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> RouteClientBuilder<Missing> {
        RouteClientBuilder::new()
    }

    /// Resolves a route.
    ///
    /// Open-ended requests (no destination) succeed immediately with a
    /// zero-distance result and touch neither the cache nor the provider.
    /// Only successful routes are cached.
    pub async fn resolve_route(&self, request: &RouteRequest) -> Response<RouteOutcome> {
        let Some(destination) = request.destination.as_deref() else {
            log::debug!("Open-ended booking from '{}', no routing needed", request.origin);
            return Response::new(RouteOutcome::Success(RouteResult::empty()));
        };

        let key = CacheKey::route(&request.origin, destination, &request.stops);
        let routes = self.inner.cache.routes();
        if let Some(entry) = routes.get_entry(key.as_str()) {
            log::debug!("Route cache hit for {}", key);
            return Response::hit(RouteOutcome::Success(entry.data.clone()), &entry, routes.ttl());
        }
        log::debug!("Route cache miss for {}, queueing provider call", key);

        let stops = request.canonical_stops();
        let call = {
            let provider = self.inner.provider.clone();
            let origin = request.origin.trim().to_string();
            let destination = destination.trim().to_string();
            let stops = stops.clone();
            let optimize = self.inner.config.optimize_waypoints;
            self.inner.throttle.enqueue(move || async move {
                provider
                    .route_between(&origin, &destination, &stops, optimize)
                    .await
            })
        };

        match call.await {
            Ok(directions) => match directions.routes.first() {
                Some(route) => {
                    let route = RouteResult::from_provider_route(route, &stops);
                    let entry = routes.put(key.as_str(), route.clone()).await;
                    Response::stored(RouteOutcome::Success(route), &entry, routes.ttl())
                }
                None => {
                    log::debug!("Provider returned no routes for {}", key);
                    Response::new(RouteOutcome::NoRouteFound)
                }
            },
            Err(err) => {
                log::warn!("Route lookup for {} failed: {}", key, err);
                Response::new(classify_route_error(err, request))
            }
        }
    }

    /// Resolves a free-text address into a place.
    ///
    /// Uses the same cache-then-throttle order as [`resolve_route`](Self::resolve_route)
    /// against the geocode table. The first provider match wins.
    pub async fn resolve_place(&self, address: &str) -> Result<Response<PlaceInfo>, ApiError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ApiError::NoResults {
                query: String::new(),
            });
        }

        let places = self.inner.cache.geocode();
        if let Some(entry) = places.get_entry(address) {
            log::debug!("Geocode cache hit for '{}'", address);
            let place = self.with_country_flag(entry.data.clone());
            return Ok(Response::hit(place, &entry, places.ttl()));
        }
        log::debug!("Geocode cache miss for '{}', queueing provider call", address);

        let call = {
            let provider = self.inner.provider.clone();
            let address = address.to_string();
            self.inner
                .throttle
                .enqueue(move || async move { provider.geocode(&address).await })
        };

        match call.await {
            Ok(results) => {
                let Some(first) = results.into_iter().next() else {
                    return Err(ApiError::NoResults {
                        query: address.to_string(),
                    });
                };
                let place = PlaceInfo::from(first);
                let entry = places.put(address, place.clone()).await;
                Ok(Response::stored(self.with_country_flag(place), &entry, places.ttl()))
            }
            Err(err) => {
                log::warn!("Geocode lookup for '{}' failed: {}", address, err);
                Err(ApiError::classify(err, address))
            }
        }
    }

    /// Returns the shared cache.
    pub fn cache(&self) -> &PersistentCache {
        &self.inner.cache
    }

    /// Returns the shared throttle.
    pub fn throttle(&self) -> &RequestThrottle {
        &self.inner.throttle
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn with_country_flag(&self, mut place: PlaceInfo) -> PlaceInfo {
        place.in_service_country = place.is_in_country(&self.inner.config.service_country);
        place
    }
}

impl std::fmt::Debug for RouteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteClient")
            .field("cache", &self.inner.cache)
            .field("throttle", &self.inner.throttle)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn classify_route_error(err: ProviderError, request: &RouteRequest) -> RouteOutcome {
    match err {
        err if err.is_empty_result() => RouteOutcome::NoRouteFound,
        ProviderError::Throttle(ThrottleError::TimedOut(_)) => RouteOutcome::Timeout,
        err => {
            let query = format!(
                "{} -> {}",
                request.origin,
                request.destination.as_deref().unwrap_or_default()
            );
            RouteOutcome::ApiError(ApiError::classify(err, &query))
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Behavior settings for the [`RouteClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// ISO country code that [`PlaceInfo::in_service_country`] is checked
    /// against.
    ///
    /// Default: `CH`
    pub service_country: String,

    /// Whether the provider may reorder stops for the shortest trip.
    ///
    /// Default: `true`
    pub optimize_waypoints: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_country: "CH".to_string(),
            optimize_waypoints: true,
        }
    }
}

impl ClientConfig {
    /// Sets the service country.
    pub fn with_service_country(mut self, code: impl Into<String>) -> Self {
        self.service_country = code.into();
        self
    }

    /// Enables or disables waypoint optimization.
    pub fn with_optimize_waypoints(mut self, enabled: bool) -> Self {
        self.optimize_waypoints = enabled;
        self
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`RouteClient`].
///
/// Uses the typestate pattern to ensure a provider is set at compile time.
/// Without an explicit cache the client uses an unpersisted in-memory one;
/// without an explicit throttle it creates one with
/// [`ThrottleConfig::default`].
pub struct RouteClientBuilder<Provider> {
    provider: Provider,
    cache: Option<Arc<PersistentCache>>,
    throttle: Option<RequestThrottle>,
    throttle_config: ThrottleConfig,
    config: ClientConfig,
}

impl RouteClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            provider: Missing,
            cache: None,
            throttle: None,
            throttle_config: ThrottleConfig::default(),
            config: ClientConfig::default(),
        }
    }

    /// Sets the routing provider.
    pub fn provider<T: RouteProvider + 'static>(
        self,
        provider: T,
    ) -> RouteClientBuilder<Set<Arc<dyn RouteProvider>>> {
        self.shared_provider(Arc::new(provider))
    }

    /// Sets an already shared routing provider.
    pub fn shared_provider(
        self,
        provider: Arc<dyn RouteProvider>,
    ) -> RouteClientBuilder<Set<Arc<dyn RouteProvider>>> {
        RouteClientBuilder {
            provider: Set(provider),
            cache: self.cache,
            throttle: self.throttle,
            throttle_config: self.throttle_config,
            config: self.config,
        }
    }
}

impl Default for RouteClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> RouteClientBuilder<P> {
    /// Sets the cache.
    pub fn cache(mut self, cache: PersistentCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Sets a cache shared with other owners.
    pub fn shared_cache(mut self, cache: Arc<PersistentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets an existing throttle, e.g. one shared with another client.
    ///
    /// Takes precedence over [`throttle_config`](Self::throttle_config).
    pub fn throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Sets the configuration for the throttle the builder creates.
    pub fn throttle_config(mut self, config: ThrottleConfig) -> Self {
        self.throttle_config = config;
        self
    }

    /// Sets the client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }
}

impl RouteClientBuilder<Set<Arc<dyn RouteProvider>>> {
    /// Builds the [`RouteClient`].
    ///
    /// # Panics
    ///
    /// Panics if no throttle was supplied and this is called outside of a
    /// Tokio runtime.
    pub fn build(self) -> RouteClient {
        let throttle = self
            .throttle
            .unwrap_or_else(|| RequestThrottle::new(self.throttle_config));

        RouteClient {
            inner: Arc::new(RouteClientInner {
                provider: self.provider.0,
                cache: self.cache.unwrap_or_default(),
                throttle,
                config: self.config,
            }),
        }
    }
}
