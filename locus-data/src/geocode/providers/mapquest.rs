//! MapQuest Geocoding API, `address` endpoint.

use locus_core::{GeocodeError, ProviderKind};
use serde::Deserialize;

use super::{ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, RetryPolicy, decode};
use crate::transport::QueryParam;

/// MapQuest strategy bundle.
pub static SPEC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::MapQuest,
    default_base_url: "https://www.mapquestapi.com",
    path: "/geocoding/v1/address",
    requires_api_key: false,
    requires_user_agent: false,
    retry: RetryPolicy::SINGLE_ATTEMPT,
    build_query,
    parse,
};

/// Quality codes MapQuest returns for country-level matches.
const COUNTRY_LEVEL_CODES: [&str; 2] = ["A1XAX", "A3XAX"];

#[derive(Debug, Deserialize)]
struct AddressResponse {
    info: Info,
    #[serde(default)]
    results: Vec<AddressResult>,
}

#[derive(Debug, Deserialize)]
struct Info {
    statuscode: Option<i64>,
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AddressResult {
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    lat_lng: LatLng,
    geocode_quality_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

fn build_query(context: &QueryContext<'_>) -> Vec<QueryParam> {
    let mut params = Vec::with_capacity(2);
    if let Some(key) = context.api_key {
        params.push(QueryParam::secret("key", key));
    }
    params.push(QueryParam::new("location", context.address));
    params
}

fn parse(body: &str, _context: &QueryContext<'_>) -> ParseOutcome {
    parse_address(body).into()
}

fn parse_address(body: &str) -> Result<ParsedLocation, GeocodeError> {
    let response: AddressResponse = decode(body)?;
    let status = response.info.statuscode.unwrap_or(-1);
    if status != 0 {
        return Err(GeocodeError::Service {
            code: status.to_string(),
            message: response.info.messages.into_iter().next().unwrap_or_default(),
        });
    }
    let location = response
        .results
        .into_iter()
        .next()
        .and_then(|result| result.locations.into_iter().next())
        .ok_or_else(|| GeocodeError::not_found("not found"))?;
    if let Some(code) = location
        .geocode_quality_code
        .as_deref()
        .filter(|code| COUNTRY_LEVEL_CODES.contains(code))
    {
        return Err(GeocodeError::not_found(format!(
            "only a country-level match ({code})"
        )));
    }
    Ok(ParsedLocation::new(location.lat_lng.lat, location.lat_lng.lng)
        .with_precision(location.geocode_quality_code))
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{failed, located, param, parse_with, query_for};
    use super::*;
    use locus_core::{FailureKind, GeocodeRequest};
    use rstest::rstest;

    fn body_with_quality(code: &str) -> String {
        format!(
            r#"{{
                "info": {{"statuscode": 0, "messages": []}},
                "results": [{{
                    "providedLocation": {{"location": "1600 Pennsylvania Ave"}},
                    "locations": [{{
                        "latLng": {{"lat": 38.897675, "lng": -77.036547}},
                        "geocodeQualityCode": "{code}"
                    }}]
                }}]
            }}"#
        )
    }

    #[test]
    fn reads_lat_lng_and_quality_code() {
        let location = located(parse_with(&SPEC, &body_with_quality("P1AAA")));
        assert_eq!(location.lat, 38.897675);
        assert_eq!(location.lng, -77.036547);
        assert_eq!(location.precision.as_deref(), Some("P1AAA"));
    }

    #[rstest]
    #[case("A1XAX")]
    #[case("A3XAX")]
    fn country_level_matches_are_not_found(#[case] code: &str) {
        let error = failed(parse_with(&SPEC, &body_with_quality(code)));
        assert_eq!(error.kind(), FailureKind::NotFound);
    }

    #[test]
    fn non_zero_status_reports_first_message() {
        let body = r#"{"info": {"statuscode": 403,
            "messages": ["This key is not authorized for this service.", "second"]},
            "results": []}"#;
        assert_eq!(
            failed(parse_with(&SPEC, body)),
            GeocodeError::Service {
                code: "403".into(),
                message: "This key is not authorized for this service.".into()
            }
        );
    }

    #[test]
    fn missing_status_is_treated_as_failure() {
        let body = r#"{"info": {}, "results": []}"#;
        assert_eq!(failed(parse_with(&SPEC, body)).kind(), FailureKind::Provider);
    }

    #[test]
    fn empty_locations_are_not_found() {
        let body = r#"{"info": {"statuscode": 0}, "results": [{"locations": []}]}"#;
        assert_eq!(failed(parse_with(&SPEC, body)).kind(), FailureKind::NotFound);
    }

    #[test]
    fn query_carries_key_and_location() {
        let request = GeocodeRequest::new("1600 Pennsylvania Ave");
        let params = query_for(&SPEC, &request, Some("mq-key"));
        assert_eq!(param(&params, "key"), Some("mq-key"));
        assert_eq!(param(&params, "location"), Some("1600 Pennsylvania Ave"));
    }
}
