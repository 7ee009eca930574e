//! Resolved places

use serde::Deserialize;
use serde::Serialize;

use crate::provider::GeocodeResult;

/// A free-text address resolved to a concrete place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    /// Normalized address.
    pub formatted_address: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Provider place identifier.
    pub place_id: String,
    /// Provider place types.
    pub types: Vec<String>,
    /// ISO 3166-1 alpha-2 country code, if known.
    pub country_code: Option<String>,
    /// Whether the place lies in the configured service country.
    ///
    /// Recomputed against the client's configuration on every lookup.
    #[serde(default)]
    pub in_service_country: bool,
}

impl PlaceInfo {
    /// Returns `true` if the place lies in the country with the given code.
    pub fn is_in_country(&self, code: &str) -> bool {
        self.country_code
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(code))
    }
}

impl From<GeocodeResult> for PlaceInfo {
    fn from(result: GeocodeResult) -> Self {
        Self {
            formatted_address: result.formatted_address,
            lat: result.lat,
            lng: result.lng,
            place_id: result.place_id,
            types: result.types,
            country_code: result.country_code,
            in_service_country: false,
        }
    }
}
