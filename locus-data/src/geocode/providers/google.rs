//! Google Maps Geocoding API.
//!
//! Google reports failures in a `status` field of a 200 response.
//! `UNKNOWN_ERROR` is transient and retried with linear backoff; every other
//! non-`OK` status is final.

use std::time::Duration;

use locus_core::{GeocodeError, ProviderKind};
use serde::Deserialize;

use super::{
    ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, RetryPolicy, condense_whitespace,
    decode, push_optional,
};
use crate::transport::QueryParam;

/// Google strategy bundle.
pub static SPEC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Google,
    default_base_url: "https://maps.googleapis.com",
    path: "/maps/api/geocode/json",
    requires_api_key: false,
    requires_user_agent: false,
    retry: RetryPolicy {
        bounded: true,
        backoff_step: Some(Duration::from_millis(1000)),
        retry_on_too_many_requests: false,
    },
    build_query,
    parse,
};

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

fn build_query(context: &QueryContext<'_>) -> Vec<QueryParam> {
    let address = condense_whitespace(&context.address.replace('+', " "));
    let mut params = vec![
        QueryParam::new("address", address),
        QueryParam::new("sensor", "false"),
    ];
    if let Some(key) = context.api_key {
        params.push(QueryParam::secret("key", key));
    }
    push_optional(
        &mut params,
        "language",
        context.request.locale.as_deref(),
        str::to_owned,
    );
    push_optional(
        &mut params,
        "components",
        context.request.country_code.as_deref(),
        |country| format!("country:{}", country.to_uppercase()),
    );
    params
}

fn parse(body: &str, _context: &QueryContext<'_>) -> ParseOutcome {
    let response: GeocodeResponse = match decode(body) {
        Ok(response) => response,
        Err(error) => return ParseOutcome::Failed(error),
    };
    let GeocodeResponse {
        status,
        results,
        error_message,
    } = response;
    let message = error_message.unwrap_or_default();
    match status.as_str() {
        "OK" => results
            .into_iter()
            .next()
            .map(|result| {
                ParsedLocation::new(result.geometry.location.lat, result.geometry.location.lng)
                    .with_precision(result.geometry.location_type)
            })
            .ok_or_else(|| GeocodeError::parse("status was OK but results were empty"))
            .into(),
        "UNKNOWN_ERROR" => ParseOutcome::Retryable(GeocodeError::Service {
            code: status.clone(),
            message,
        }),
        "ZERO_RESULTS" => ParseOutcome::Failed(GeocodeError::not_found("ZERO_RESULTS")),
        "OVER_QUERY_LIMIT" => ParseOutcome::Failed(GeocodeError::RateLimited {
            status: None,
            message: if message.is_empty() {
                status.clone()
            } else {
                message
            },
        }),
        _ => ParseOutcome::Failed(GeocodeError::Service {
            code: status.clone(),
            message,
        }),
    }
}
