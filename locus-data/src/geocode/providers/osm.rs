//! OpenStreetMap Nominatim `search`.
//!
//! Nominatim's usage policy requires an identifying `User-Agent` and at most
//! one request per second. A 429 answer is retried within the configured
//! attempt budget, each attempt waiting for the limiter again.

use locus_core::{GeocodeError, PlaceDetails, ProviderKind};
use serde::Deserialize;

use super::{
    ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, RetryPolicy, condense_whitespace,
    decode, non_blank, push_optional,
};
use crate::transport::QueryParam;

/// OSM strategy bundle.
pub static SPEC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Osm,
    default_base_url: "https://nominatim.openstreetmap.org",
    path: "/search",
    requires_api_key: false,
    requires_user_agent: true,
    retry: RetryPolicy {
        bounded: true,
        backoff_step: None,
        retry_on_too_many_requests: true,
    },
    build_query,
    parse,
};

/// Candidates requested when the request sets no limit.
const DEFAULT_LIMIT: u32 = 1;

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: Option<String>,
    osm_type: Option<String>,
    osm_id: Option<i64>,
    class: Option<String>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    category: Option<String>,
    importance: Option<f64>,
}

fn build_query(context: &QueryContext<'_>) -> Vec<QueryParam> {
    let request = context.request;
    let mut params = vec![
        QueryParam::new("q", condense_whitespace(context.address)),
        QueryParam::new("format", "json"),
        QueryParam::new(
            "limit",
            request.limit.unwrap_or(DEFAULT_LIMIT).max(1).to_string(),
        ),
    ];
    push_optional(
        &mut params,
        "countrycodes",
        request.country_code.as_deref(),
        str::to_lowercase,
    );
    if request.address_details {
        params.push(QueryParam::new("addressdetails", "1"));
    }
    params
}

fn parse(body: &str, _context: &QueryContext<'_>) -> ParseOutcome {
    parse_search(body).into()
}

fn parse_degrees(raw: &str, field: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse()
        .map_err(|_| GeocodeError::parse(format!("invalid {field} in response: {raw:?}")))
}

fn parse_search(body: &str) -> Result<ParsedLocation, GeocodeError> {
    let places: Vec<Place> = decode(body)?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::not_found("ZERO_RESULTS"))?;
    let lat = parse_degrees(&place.lat, "lat")?;
    let lng = parse_degrees(&place.lon, "lon")?;

    let class = non_blank(place.class);
    let place_type = non_blank(place.place_type);
    let precision = [class.as_deref(), place_type.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("_");

    let details = PlaceDetails {
        display_name: non_blank(place.display_name),
        osm_type: non_blank(place.osm_type),
        osm_id: place.osm_id,
        category: non_blank(place.category).or(class),
        result_type: place_type,
        importance: place.importance,
        ..PlaceDetails::default()
    };
    Ok(ParsedLocation::new(lat, lng)
        .with_precision(Some(precision))
        .with_details(details))
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{failed, located, param, parse_with, query_for};
    use super::*;
    use locus_core::{FailureKind, GeocodeRequest};

    const SEARCH: &str = r#"[{
        "place_id": 307292131,
        "licence": "Data © OpenStreetMap contributors, ODbL 1.0. http://osm.org/copyright",
        "osm_type": "way",
        "osm_id": 238241022,
        "lat": "38.897699700000004",
        "lon": "-77.03655315",
        "class": "office",
        "type": "government",
        "place_rank": 30,
        "importance": 0.6347,
        "display_name": "White House, 1600, Pennsylvania Avenue Northwest, Washington, District of Columbia, 20500, United States"
    }]"#;

    #[test]
    fn parses_string_coordinates_and_details() {
        let location = located(parse_with(&SPEC, SEARCH));
        assert_eq!(location.lat, 38.897_699_700_000_004);
        assert_eq!(location.lng, -77.036_553_15);
        assert_eq!(location.precision.as_deref(), Some("office_government"));
        let details = location.details.expect("details are populated");
        assert_eq!(details.osm_type.as_deref(), Some("way"));
        assert_eq!(details.osm_id, Some(238_241_022));
        assert_eq!(details.category.as_deref(), Some("office"));
        assert_eq!(details.result_type.as_deref(), Some("government"));
        assert_eq!(details.importance, Some(0.6347));
        assert!(
            details
                .display_name
                .as_deref()
                .is_some_and(|name| name.starts_with("White House"))
        );
    }

    #[test]
    fn empty_array_is_zero_results() {
        assert_eq!(
            failed(parse_with(&SPEC, "[]")),
            GeocodeError::not_found("ZERO_RESULTS")
        );
    }

    #[test]
    fn non_numeric_coordinate_is_a_parse_failure() {
        let body = r#"[{"lat": "north", "lon": "-77.0"}]"#;
        assert_eq!(failed(parse_with(&SPEC, body)).kind(), FailureKind::Parse);
    }

    #[test]
    fn object_payload_is_a_parse_failure() {
        let body = r#"{"error": "Unable to geocode"}"#;
        assert_eq!(failed(parse_with(&SPEC, body)).kind(), FailureKind::Parse);
    }

    #[test]
    fn query_includes_tuning() {
        let request = GeocodeRequest::new("1600  Pennsylvania\tAve")
            .with_limit(5)
            .with_country_code("US")
            .with_address_details(true);
        let params = query_for(&SPEC, &request, None);
        assert_eq!(param(&params, "q"), Some("1600 Pennsylvania Ave"));
        assert_eq!(param(&params, "format"), Some("json"));
        assert_eq!(param(&params, "limit"), Some("5"));
        assert_eq!(param(&params, "countrycodes"), Some("us"));
        assert_eq!(param(&params, "addressdetails"), Some("1"));
    }

    #[test]
    fn query_defaults_to_one_result_without_details() {
        let params = query_for(&SPEC, &GeocodeRequest::new("Main St"), None);
        assert_eq!(param(&params, "limit"), Some("1"));
        assert_eq!(param(&params, "addressdetails"), None);
        assert_eq!(param(&params, "countrycodes"), None);
    }
}
