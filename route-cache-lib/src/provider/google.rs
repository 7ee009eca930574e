//! Google Maps Directions and Geocoding web service provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::DirectionsResponse;
use super::GeocodeResult;
use super::ProviderRoute;
use super::RouteLeg;
use super::RouteProvider;
use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// [`RouteProvider`] backed by the Google Maps JSON web services.
///
/// Cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use route_cache::provider::GoogleMapsProvider;
///
/// let provider = GoogleMapsProvider::builder()
///     .api_key("my-key")
///     .region("ch")
///     .language("en")
///     .build();
/// ```
#[derive(Clone)]
pub struct GoogleMapsProvider {
    inner: Arc<GoogleMapsProviderInner>,
}

struct GoogleMapsProviderInner {
    api_key: String,
    base_url: String,
    language: Option<String>,
    region: Option<String>,
    http_client: Client,
    timeout: Option<Duration>,
}

impl GoogleMapsProvider {
    /// Creates a new builder for constructing a provider.
    pub fn builder() -> GoogleMapsProviderBuilder<Missing> {
        GoogleMapsProviderBuilder::new()
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, service: &str, mut params: Vec<(&str, String)>) -> Result<Url, ProviderError> {
        if let Some(language) = &self.inner.language {
            params.push(("language", language.clone()));
        }
        if let Some(region) = &self.inner.region {
            params.push(("region", region.clone()));
        }
        params.push(("key", self.inner.api_key.clone()));

        let base = format!(
            "{}/{}/json",
            self.inner.base_url.trim_end_matches('/'),
            service
        );
        Url::parse_with_params(&base, &params)
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid URL: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        let mut request = self.inner.http_client.get(url);
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RouteProvider for GoogleMapsProvider {
    async fn route_between(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
        optimize_waypoints: bool,
    ) -> Result<DirectionsResponse, ProviderError> {
        let mut params = vec![
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
            ("mode", "driving".to_string()),
        ];
        if let Some(waypoints) = waypoints_param(waypoints, optimize_waypoints) {
            params.push(("waypoints", waypoints));
        }

        let url = self.endpoint("directions", params)?;
        log::debug!("Requesting directions {} -> {}", origin, destination);
        let wire: DirectionsWire = self.get_json(url).await?;
        wire.into_response()
    }

    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, ProviderError> {
        let url = self.endpoint("geocode", vec![("address", address.to_string())])?;
        log::debug!("Requesting geocode for {}", address);
        let wire: GeocodeWire = self.get_json(url).await?;
        wire.into_results()
    }
}

impl std::fmt::Debug for GoogleMapsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsProvider")
            .field("base_url", &self.inner.base_url)
            .field("language", &self.inner.language)
            .field("region", &self.inner.region)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

fn waypoints_param(waypoints: &[String], optimize: bool) -> Option<String> {
    if waypoints.is_empty() {
        return None;
    }
    let joined = waypoints.join("|");
    Some(if optimize {
        format!("optimize:true|{}", joined)
    } else {
        joined
    })
}

/// Maps a service `status` onto the error taxonomy. `OK` is the only success.
fn check_status(status: &str, error_message: Option<String>) -> Result<(), ProviderError> {
    let message = error_message.unwrap_or_else(|| status.to_string());
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(ProviderError::ZeroResults),
        "NOT_FOUND" => Err(ProviderError::NotFound),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(ProviderError::OverQueryLimit(message)),
        "REQUEST_DENIED" => Err(ProviderError::RequestDenied(message)),
        "INVALID_REQUEST" | "MAX_WAYPOINTS_EXCEEDED" | "MAX_ROUTE_LENGTH_EXCEEDED" => {
            Err(ProviderError::InvalidRequest(message))
        }
        other => Err(ProviderError::Unknown(format!("{}: {}", other, message))),
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`GoogleMapsProvider`].
///
/// `api_key` is required and enforced at compile time.
pub struct GoogleMapsProviderBuilder<Key> {
    api_key: Key,
    base_url: String,
    language: Option<String>,
    region: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl GoogleMapsProviderBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_key: Missing,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: None,
            region: None,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the API key.
    pub fn api_key(self, key: impl Into<String>) -> GoogleMapsProviderBuilder<Set<String>> {
        GoogleMapsProviderBuilder {
            api_key: Set(key.into()),
            base_url: self.base_url,
            language: self.language,
            region: self.region,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for GoogleMapsProviderBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> GoogleMapsProviderBuilder<K> {
    /// Overrides the service base URL.
    ///
    /// Defaults to `https://maps.googleapis.com/maps/api`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the response language (e.g. `en`, `de`).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the region bias (ccTLD, e.g. `ch`).
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// Ignored when a custom HTTP client is supplied.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl GoogleMapsProviderBuilder<Set<String>> {
    /// Builds the [`GoogleMapsProvider`].
    pub fn build(self) -> GoogleMapsProvider {
        let http_client = self.http_client.unwrap_or_else(|| {
            let mut builder = Client::builder();
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            builder.build().unwrap_or_default()
        });

        GoogleMapsProvider {
            inner: Arc::new(GoogleMapsProviderInner {
                api_key: self.api_key.0,
                base_url: self.base_url,
                language: self.language,
                region: self.region,
                http_client,
                timeout: self.timeout,
            }),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct DirectionsWire {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteWire>,
}

#[derive(Debug, Deserialize)]
struct RouteWire {
    #[serde(default)]
    legs: Vec<LegWire>,
    #[serde(default)]
    waypoint_order: Vec<usize>,
    #[serde(default)]
    overview_polyline: Option<PolylineWire>,
}

#[derive(Debug, Deserialize)]
struct LegWire {
    distance: Option<ValueWire>,
    duration: Option<ValueWire>,
}

#[derive(Debug, Deserialize)]
struct ValueWire {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct PolylineWire {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeWire {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResultWire>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultWire {
    formatted_address: String,
    geometry: GeometryWire,
    place_id: String,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    address_components: Vec<AddressComponentWire>,
}

#[derive(Debug, Deserialize)]
struct GeometryWire {
    location: LatLngWire,
}

#[derive(Debug, Deserialize)]
struct LatLngWire {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponentWire {
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl DirectionsWire {
    fn into_response(self) -> Result<DirectionsResponse, ProviderError> {
        check_status(&self.status, self.error_message)?;

        let routes = self
            .routes
            .into_iter()
            .map(|route| ProviderRoute {
                legs: route
                    .legs
                    .into_iter()
                    .map(|leg| RouteLeg {
                        distance_meters: leg.distance.map_or(0, |d| d.value),
                        duration_seconds: leg.duration.map_or(0, |d| d.value),
                    })
                    .collect(),
                waypoint_order: route.waypoint_order,
                polyline: route.overview_polyline.map(|p| p.points).unwrap_or_default(),
            })
            .collect();

        Ok(DirectionsResponse { routes })
    }
}

impl GeocodeWire {
    fn into_results(self) -> Result<Vec<GeocodeResult>, ProviderError> {
        check_status(&self.status, self.error_message)?;

        Ok(self
            .results
            .into_iter()
            .map(|result| {
                let country_code = result
                    .address_components
                    .iter()
                    .find(|c| c.types.iter().any(|t| t == "country"))
                    .map(|c| c.short_name.clone());
                GeocodeResult {
                    formatted_address: result.formatted_address,
                    lat: result.geometry.location.lat,
                    lng: result.geometry.location.lng,
                    place_id: result.place_id,
                    types: result.types,
                    country_code,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_directions(body: &str) -> Result<DirectionsResponse, ProviderError> {
        serde_json::from_str::<DirectionsWire>(body)
            .expect("valid JSON")
            .into_response()
    }

    #[test]
    fn test_directions_ok() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "legs": [
                    {"distance": {"text": "30 km", "value": 30000}, "duration": {"text": "25 mins", "value": 1500}},
                    {"distance": {"text": "28 km", "value": 28000}, "duration": {"text": "22 mins", "value": 1320}}
                ],
                "waypoint_order": [0],
                "overview_polyline": {"points": "abc"}
            }]
        }"#;
        let response = parse_directions(body).expect("route");
        assert_eq!(response.routes.len(), 1);
        let route = &response.routes[0];
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.legs[1].distance_meters, 28000);
        assert_eq!(route.waypoint_order, vec![0]);
        assert_eq!(route.polyline, "abc");
    }

    #[test]
    fn test_directions_status_mapping() {
        assert_eq!(
            parse_directions(r#"{"status": "ZERO_RESULTS", "routes": []}"#),
            Err(ProviderError::ZeroResults)
        );
        assert_eq!(
            parse_directions(r#"{"status": "NOT_FOUND"}"#),
            Err(ProviderError::NotFound)
        );
        assert_eq!(
            parse_directions(r#"{"status": "OVER_QUERY_LIMIT", "error_message": "slow down"}"#),
            Err(ProviderError::OverQueryLimit("slow down".into()))
        );
        assert_eq!(
            parse_directions(r#"{"status": "REQUEST_DENIED"}"#),
            Err(ProviderError::RequestDenied("REQUEST_DENIED".into()))
        );
        assert!(matches!(
            parse_directions(r#"{"status": "SOMETHING_NEW"}"#),
            Err(ProviderError::Unknown(_))
        ));
    }

    #[test]
    fn test_geocode_country_code() {
        let body = r#"{
            "status": "OK",
            "results": [{
                "formatted_address": "8058 Zurich Airport, Switzerland",
                "geometry": {"location": {"lat": 47.4582, "lng": 8.5555}},
                "place_id": "ChIJ-abc",
                "types": ["airport", "point_of_interest"],
                "address_components": [
                    {"long_name": "Kloten", "short_name": "Kloten", "types": ["locality"]},
                    {"long_name": "Switzerland", "short_name": "CH", "types": ["country", "political"]}
                ]
            }]
        }"#;
        let results = serde_json::from_str::<GeocodeWire>(body)
            .expect("valid JSON")
            .into_results()
            .expect("results");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].country_code.as_deref(), Some("CH"));
        assert_eq!(results[0].types, vec!["airport", "point_of_interest"]);
    }

    #[test]
    fn test_waypoints_param() {
        assert_eq!(waypoints_param(&[], true), None);
        let stops = vec!["Baar".to_string(), "Zug".to_string()];
        assert_eq!(
            waypoints_param(&stops, true).as_deref(),
            Some("optimize:true|Baar|Zug")
        );
        assert_eq!(waypoints_param(&stops, false).as_deref(), Some("Baar|Zug"));
    }

    #[test]
    fn test_endpoint_includes_key_and_region() {
        let provider = GoogleMapsProvider::builder()
            .api_key("secret")
            .region("ch")
            .base_url("http://localhost:9999/maps/api/")
            .build();
        let url = provider
            .endpoint("geocode", vec![("address", "Bern".to_string())])
            .expect("url");
        assert_eq!(url.path(), "/maps/api/geocode/json");
        let query = url.query().unwrap_or_default();
        assert!(query.contains("address=Bern"));
        assert!(query.contains("region=ch"));
        assert!(query.contains("key=secret"));
    }
}
