//! Per-provider strategy bundles.
//!
//! A [`ProviderSpec`] is plain data plus two functions: one turns a validated
//! request into query parameters, the other turns a 200 response body into a
//! [`ParseOutcome`]. Each provider module owns its wire types and exposes one
//! `static SPEC`.

use std::time::Duration;

use locus_core::{GeocodeError, GeocodeRequest, PlaceDetails, ProviderKind};
use serde::de::DeserializeOwned;

use crate::transport::QueryParam;

pub mod esri;
pub mod geoapify;
pub mod geocodio;
pub mod google;
pub mod mapquest;
pub mod osm;

/// How a provider retries within one geocode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether `max_tries` applies; single-attempt providers ignore it.
    pub bounded: bool,
    /// Linear backoff step: attempt `n` waits `n * step` before retrying.
    pub backoff_step: Option<Duration>,
    /// Whether HTTP 429 counts as retryable.
    pub retry_on_too_many_requests: bool,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub const SINGLE_ATTEMPT: Self = Self {
        bounded: false,
        backoff_step: None,
        retry_on_too_many_requests: false,
    };
}

/// Everything a query builder or parser may consult.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    /// Normalised address.
    pub address: &'a str,
    /// Effective API key, request value first, then configured value.
    pub api_key: Option<&'a str>,
    /// The original request, for provider tuning fields.
    pub request: &'a GeocodeRequest,
}

/// A location read from a provider payload, before range checks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedLocation {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Provider-specific precision indicator.
    pub precision: Option<String>,
    /// Extra place metadata.
    pub details: Option<PlaceDetails>,
}

impl ParsedLocation {
    /// A bare location.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            ..Self::default()
        }
    }

    /// Attach a precision indicator, ignoring blank values.
    #[must_use]
    pub fn with_precision(mut self, precision: Option<String>) -> Self {
        self.precision = non_blank(precision);
        self
    }

    /// Attach place details.
    #[must_use]
    pub fn with_details(mut self, details: PlaceDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result of interpreting one response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The payload named a location.
    Located(ParsedLocation),
    /// The provider reported a transient condition worth another attempt.
    Retryable(GeocodeError),
    /// The payload is final and names no usable location.
    Failed(GeocodeError),
}

impl From<Result<ParsedLocation, GeocodeError>> for ParseOutcome {
    fn from(value: Result<ParsedLocation, GeocodeError>) -> Self {
        match value {
            Ok(location) => Self::Located(location),
            Err(error) => Self::Failed(error),
        }
    }
}

/// Static description of one provider.
#[derive(Debug)]
pub struct ProviderSpec {
    /// Provider tag stamped on every coordinate.
    pub kind: ProviderKind,
    /// Public endpoint, overridable through configuration.
    pub default_base_url: &'static str,
    /// Path of the geocode resource.
    pub path: &'static str,
    /// Whether a request without an API key is rejected up front.
    pub requires_api_key: bool,
    /// Whether a `User-Agent` header must accompany every request.
    pub requires_user_agent: bool,
    /// Retry behaviour.
    pub retry: RetryPolicy,
    /// Query builder.
    pub build_query: fn(&QueryContext<'_>) -> Vec<QueryParam>,
    /// Response parser.
    pub parse: fn(&str, &QueryContext<'_>) -> ParseOutcome,
}

/// Strategy bundle for `kind`, or `None` for [`ProviderKind::Unknown`].
#[must_use]
pub fn spec_for(kind: ProviderKind) -> Option<&'static ProviderSpec> {
    match kind {
        ProviderKind::Esri => Some(&esri::SPEC),
        ProviderKind::Google => Some(&google::SPEC),
        ProviderKind::MapQuest => Some(&mapquest::SPEC),
        ProviderKind::Geoapify => Some(&geoapify::SPEC),
        ProviderKind::Osm => Some(&osm::SPEC),
        ProviderKind::Geocodio => Some(&geocodio::SPEC),
        ProviderKind::Unknown => None,
    }
}

/// Deserialise a provider payload, mapping shape errors to a parse failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GeocodeError> {
    serde_json::from_str(body).map_err(|err| GeocodeError::parse(err.to_string()))
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn condense_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `None` for missing or whitespace-only strings.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Push `name=value` when the request carries a non-blank value.
pub(crate) fn push_optional(
    params: &mut Vec<QueryParam>,
    name: &str,
    value: Option<&str>,
    map: impl FnOnce(&str) -> String,
) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        params.push(QueryParam::new(name, map(value)));
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  a \t b\n c ", "a b c")]
    #[case("single", "single")]
    #[case("", "")]
    fn condenses_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(condense_whitespace(input), expected);
    }

    #[test]
    fn every_real_provider_has_a_spec() {
        for kind in ProviderKind::ALL {
            let spec = spec_for(kind).expect("spec exists");
            assert_eq!(spec.kind, kind);
        }
        assert!(spec_for(ProviderKind::Unknown).is_none());
    }
}
