//! Route requests, address inputs and cache keys

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// A place chosen from an autocomplete suggestion.
///
/// Only [`address`](Self::address) takes part in routing; the remaining
/// fields are metadata carried along by the address field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSelection {
    /// Human-readable address of the selected place.
    pub address: String,
    /// Provider place identifier, if known.
    pub place_id: Option<String>,
    /// Latitude, if known.
    pub lat: Option<f64>,
    /// Longitude, if known.
    pub lng: Option<f64>,
}

impl PlaceSelection {
    /// Creates a selection with only an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            place_id: None,
            lat: None,
            lng: None,
        }
    }

    /// Sets the provider place identifier.
    pub fn with_place_id(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    /// Sets the coordinates.
    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }
}

/// The value of an address field: either free text being typed or a
/// selected place.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceInput {
    /// Free text.
    Text(String),
    /// A selected autocomplete suggestion.
    Selection(PlaceSelection),
}

impl PlaceInput {
    /// Returns the plain address string, unwrapping selection metadata.
    pub fn address(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Selection(selection) => &selection.address,
        }
    }

    /// Consumes the input and returns the plain address string.
    pub fn into_address(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Selection(selection) => selection.address,
        }
    }
}

impl From<&str> for PlaceInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PlaceInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PlaceSelection> for PlaceInput {
    fn from(selection: PlaceSelection) -> Self {
        Self::Selection(selection)
    }
}

/// A request for a route between two addresses via optional stops.
///
/// `destination == None` denotes an open-ended ("hourly") booking, for which
/// no routing is needed.
///
/// # Example
///
/// ```
/// use route_cache::model::RouteRequest;
///
/// let request = RouteRequest::new("Zurich Airport", "Lucerne").with_stop("Zug");
/// assert!(!request.is_open_ended());
///
/// let hourly = RouteRequest::hourly("Bern");
/// assert!(hourly.is_open_ended());
/// assert!(hourly.cache_key().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Pickup address.
    pub origin: String,
    /// Drop-off address, `None` for open-ended bookings.
    pub destination: Option<String>,
    /// Intermediate stops, in the order they were entered.
    pub stops: Vec<String>,
}

impl RouteRequest {
    /// Creates a point-to-point request without stops.
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: Some(destination.into()),
            stops: Vec::new(),
        }
    }

    /// Creates an open-ended request with only an origin.
    pub fn hourly(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: None,
            stops: Vec::new(),
        }
    }

    /// Builds a request from raw address field values.
    ///
    /// Addresses are trimmed, so inputs differing only in surrounding
    /// whitespace compare equal.
    pub fn from_inputs(
        origin: PlaceInput,
        destination: Option<PlaceInput>,
        stops: Vec<PlaceInput>,
    ) -> Self {
        fn trimmed(input: PlaceInput) -> String {
            let address = input.into_address();
            if address.trim().len() == address.len() {
                address
            } else {
                address.trim().to_string()
            }
        }

        Self {
            origin: trimmed(origin),
            destination: destination.map(trimmed),
            stops: stops.into_iter().map(trimmed).collect(),
        }
    }

    /// Appends a stop.
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stops.push(stop.into());
        self
    }

    /// Appends several stops.
    pub fn with_stops<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stops.extend(stops.into_iter().map(Into::into));
        self
    }

    /// Returns `true` for open-ended bookings.
    pub fn is_open_ended(&self) -> bool {
        self.destination.is_none()
    }

    /// Returns `true` if any stop is empty or whitespace-only.
    pub fn has_blank_stop(&self) -> bool {
        self.stops.iter().any(|stop| stop.trim().is_empty())
    }

    /// Returns `true` if every address in the request is non-blank.
    pub fn is_calculable(&self) -> bool {
        !self.origin.trim().is_empty()
            && self
                .destination
                .as_deref()
                .is_none_or(|destination| !destination.trim().is_empty())
            && !self.has_blank_stop()
    }

    /// Returns the stops trimmed and sorted.
    ///
    /// This is the order stops are keyed by and sent to the provider in.
    pub fn canonical_stops(&self) -> Vec<String> {
        let mut stops: Vec<String> = self.stops.iter().map(|s| s.trim().to_string()).collect();
        stops.sort();
        stops
    }

    /// Returns the route cache key, or `None` for open-ended requests.
    pub fn cache_key(&self) -> Option<CacheKey> {
        let destination = self.destination.as_deref()?;
        Some(CacheKey::route(&self.origin, destination, &self.stops))
    }
}

/// Deterministic key for the route cache table.
///
/// Derived from `(origin, destination, sorted stops)`: origin and
/// destination order is significant, stop order is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Computes the key for a route.
    pub fn route(origin: &str, destination: &str, stops: &[String]) -> Self {
        let mut stops: Vec<&str> = stops.iter().map(|s| s.trim()).collect();
        stops.sort_unstable();

        let mut hasher = Sha256::new();
        hash_field(&mut hasher, origin.trim());
        hash_field(&mut hasher, destination.trim());
        hasher.update((stops.len() as u64).to_le_bytes());
        for stop in stops {
            hash_field(&mut hasher, stop);
        }

        Self(format!("route:{:x}", hasher.finalize()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Length-prefixes each field so that no two tuples share an encoding.
fn hash_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_order_does_not_change_key() {
        let a = RouteRequest::new("Zurich Airport", "Lucerne").with_stops(["Zug", "Baar"]);
        let b = RouteRequest::new("Zurich Airport", "Lucerne").with_stops(["Baar", "Zug"]);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_origin_destination_order_matters() {
        let forward = RouteRequest::new("Bern", "Thun").cache_key();
        let backward = RouteRequest::new("Thun", "Bern").cache_key();
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_fields_do_not_bleed_into_each_other() {
        let a = RouteRequest::new("Bern", "Thun").with_stop("Spiez");
        let b = RouteRequest::new("Bern", "ThunSpiez");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_key_ignores_surrounding_whitespace() {
        let a = RouteRequest::new(" Bern", "Thun ").cache_key();
        let b = RouteRequest::new("Bern", "Thun").cache_key();
        assert_eq!(a, b);
        assert!(a.is_some_and(|key| key.as_str().starts_with("route:")));
    }

    #[test]
    fn test_blank_stops() {
        let request = RouteRequest::new("Bern", "Thun").with_stop("  ");
        assert!(request.has_blank_stop());
        assert!(!request.is_calculable());

        assert!(!RouteRequest::hourly(" ").is_calculable());
        assert!(!RouteRequest::new("Bern", "").is_calculable());
        assert!(RouteRequest::hourly("Bern").is_calculable());
    }

    #[test]
    fn test_from_inputs_unwraps_selections() {
        let request = RouteRequest::from_inputs(
            PlaceSelection::new("Zurich Airport")
                .with_place_id("abc")
                .into(),
            Some("Lucerne".into()),
            vec![PlaceSelection::new("Zug").with_location(47.17, 8.52).into()],
        );
        assert_eq!(
            request,
            RouteRequest::new("Zurich Airport", "Lucerne").with_stop("Zug")
        );
    }

    #[test]
    fn test_from_inputs_trims_addresses() {
        let request = RouteRequest::from_inputs(
            " Bern".into(),
            Some("Thun  ".into()),
            vec!["\tSpiez ".into(), "  ".into()],
        );
        assert_eq!(request, RouteRequest::new("Bern", "Thun").with_stops(["Spiez", ""]));
        assert!(request.has_blank_stop());
    }
}
