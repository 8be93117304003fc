//! Successful geocode payloads.

use crate::Coordinate;

use super::GeocodeError;

/// Outcome of a single geocode call: never both a coordinate and a failure.
pub type GeocodeResult = Result<GeocodeSuccess, GeocodeError>;

/// A resolved coordinate together with the provider's raw payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeocodeSuccess {
    /// Normalised coordinate tagged with the owning provider.
    pub coordinate: Coordinate,
    /// Response body exactly as the provider sent it.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub raw_payload: String,
    /// Extra place metadata for providers that report it.
    pub details: Option<PlaceDetails>,
}

impl GeocodeSuccess {
    /// Wrap a coordinate and its raw payload.
    pub fn new(coordinate: Coordinate, raw_payload: impl Into<String>) -> Self {
        Self {
            coordinate,
            raw_payload: raw_payload.into(),
            details: None,
        }
    }

    /// Attach place details.
    #[must_use]
    pub fn with_details(mut self, details: PlaceDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Place metadata reported by OSM and Geoapify.
///
/// Every field is optional; providers fill what they know.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct PlaceDetails {
    /// Full display name or normalised formatted address.
    pub display_name: Option<String>,
    /// Street address lines joined with `", "`.
    pub street_address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or province.
    pub state: Option<String>,
    /// Postal code.
    pub postcode: Option<String>,
    /// ISO country code.
    pub country_code: Option<String>,
    /// Result type, e.g. `building` or `street`.
    pub result_type: Option<String>,
    /// Provider category or class.
    pub category: Option<String>,
    /// Plus code of the location.
    pub plus_code: Option<String>,
    /// How the provider matched the query.
    pub match_type: Option<String>,
    /// OSM element type (`node`, `way`, `relation`).
    pub osm_type: Option<String>,
    /// OSM element identifier.
    pub osm_id: Option<i64>,
    /// Provider-reported importance in `[0, 1]`.
    pub importance: Option<f64>,
}
