//! ArcGIS World Geocoding Service, `find` operation.
//!
//! See: <https://developers.arcgis.com/rest/geocode/api-reference/geocoding-find.htm>

use locus_core::{GeocodeError, ProviderKind};
use serde::Deserialize;

use super::{
    ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, RetryPolicy, decode, push_optional,
};
use crate::transport::QueryParam;

/// Esri strategy bundle.
pub static SPEC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Esri,
    default_base_url: "https://geocode.arcgis.com",
    path: "/arcgis/rest/services/World/GeocodeServer/find",
    requires_api_key: false,
    requires_user_agent: false,
    retry: RetryPolicy::SINGLE_ATTEMPT,
    build_query,
    parse,
};

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    locations: Vec<FindLocation>,
    error: Option<EsriError>,
}

#[derive(Debug, Deserialize)]
struct FindLocation {
    feature: Feature,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    attributes: Option<Attributes>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    #[serde(rename = "Score")]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EsriError {
    code: i64,
    #[serde(default)]
    message: String,
}

fn build_query(context: &QueryContext<'_>) -> Vec<QueryParam> {
    let mut params = vec![
        QueryParam::new("text", context.address),
        QueryParam::new("f", "pjson"),
        QueryParam::new("forStorage", "false"),
        QueryParam::new("maxLocations", "1"),
    ];
    if let Some(token) = context.api_key {
        params.push(QueryParam::secret("token", token));
    }
    push_optional(
        &mut params,
        "sourceCountry",
        context.request.country_code.as_deref(),
        str::to_uppercase,
    );
    params
}

fn parse(body: &str, _context: &QueryContext<'_>) -> ParseOutcome {
    parse_find(body).into()
}

fn parse_find(body: &str) -> Result<ParsedLocation, GeocodeError> {
    let response: FindResponse = decode(body)?;
    if let Some(error) = response.error {
        return Err(GeocodeError::Service {
            code: error.code.to_string(),
            message: error.message,
        });
    }
    let feature = response
        .locations
        .into_iter()
        .next()
        .map(|location| location.feature)
        .ok_or_else(|| GeocodeError::not_found("location result was null"))?;
    let geometry = feature
        .geometry
        .ok_or_else(|| GeocodeError::not_found("location had no geometry"))?;
    let score = feature
        .attributes
        .and_then(|attributes| attributes.score)
        .map(|score| score.to_string());
    Ok(ParsedLocation::new(geometry.y, geometry.x).with_precision(score))
}
