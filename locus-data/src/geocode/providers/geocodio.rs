//! Geocodio forward geocoding.
//!
//! See: <https://www.geocod.io/docs/#geocoding>

use locus_core::{GeocodeError, ProviderKind};
use serde::Deserialize;

use super::{
    ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, RetryPolicy, decode, push_optional,
};
use crate::transport::QueryParam;

/// Geocodio strategy bundle.
pub static SPEC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Geocodio,
    default_base_url: "https://api.geocod.io",
    path: "/v1.4/geocode",
    requires_api_key: false,
    requires_user_agent: false,
    retry: RetryPolicy::SINGLE_ATTEMPT,
    build_query,
    parse,
};

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodioResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodioResult {
    location: Location,
    accuracy_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

fn build_query(context: &QueryContext<'_>) -> Vec<QueryParam> {
    let mut params = Vec::with_capacity(4);
    if let Some(key) = context.api_key {
        params.push(QueryParam::secret("api_key", key));
    }
    params.push(QueryParam::new("limit", "1"));
    params.push(QueryParam::new("q", context.address));
    push_optional(
        &mut params,
        "country",
        context.request.country_code.as_deref(),
        str::to_owned,
    );
    params
}

fn parse(body: &str, _context: &QueryContext<'_>) -> ParseOutcome {
    parse_geocode(body).into()
}

fn parse_geocode(body: &str) -> Result<ParsedLocation, GeocodeError> {
    let response: GeocodeResponse = decode(body)?;
    if let Some(message) = response.error {
        return Err(GeocodeError::Service {
            code: "error".to_owned(),
            message,
        });
    }
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::not_found("no results"))?;
    // Geocodio names both axes explicitly; map them straight through, never swapped.
    Ok(ParsedLocation::new(result.location.lat, result.location.lng)
        .with_precision(result.accuracy_type))
}
