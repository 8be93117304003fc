//! Geoapify forward geocoding.
//!
//! Besides the coordinate, Geoapify reports a structured address which is
//! surfaced as [`PlaceDetails`]. A result without a street address is treated
//! as not found.

use locus_core::{GeocodeError, PlaceDetails, ProviderKind};
use serde::Deserialize;

use super::{
    ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, RetryPolicy, decode, non_blank,
    push_optional,
};
use crate::transport::QueryParam;

/// Geoapify strategy bundle.
pub static SPEC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Geoapify,
    default_base_url: "https://api.geoapify.com",
    path: "/v1/geocode/search",
    requires_api_key: true,
    requires_user_agent: false,
    retry: RetryPolicy::SINGLE_ATTEMPT,
    build_query,
    parse,
};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Properties {
    lat: Option<f64>,
    lon: Option<f64>,
    rank: Option<Rank>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    formatted: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country_code: Option<String>,
    result_type: Option<String>,
    category: Option<String>,
    plus_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Rank {
    match_type: Option<String>,
}

fn build_query(context: &QueryContext<'_>) -> Vec<QueryParam> {
    let mut params = vec![QueryParam::new("text", context.address)];
    if let Some(key) = context.api_key {
        params.push(QueryParam::secret("apiKey", key));
    }
    push_optional(
        &mut params,
        "lang",
        context.request.locale.as_deref(),
        str::to_owned,
    );
    push_optional(
        &mut params,
        "filter",
        context.request.country_code.as_deref(),
        |country| format!("countrycode:{}", country.to_lowercase()),
    );
    params
}

fn parse(body: &str, context: &QueryContext<'_>) -> ParseOutcome {
    parse_search(body, context.address).into()
}

fn parse_search(body: &str, address: &str) -> Result<ParsedLocation, GeocodeError> {
    let response: SearchResponse = decode(body)?;
    let properties = response
        .features
        .into_iter()
        .next()
        .map(|feature| feature.properties)
        .ok_or_else(|| GeocodeError::not_found("no features found in response"))?;
    let (Some(lat), Some(lon)) = (properties.lat, properties.lon) else {
        return Err(GeocodeError::parse("feature properties lacked lat/lon"));
    };

    let street_address = [properties.address_line1, properties.address_line2]
        .into_iter()
        .filter_map(non_blank)
        .collect::<Vec<_>>()
        .join(", ");
    if street_address.is_empty() {
        return Err(GeocodeError::not_found("street address was empty"));
    }
    let display_name = non_blank(properties.formatted).unwrap_or_else(|| address.to_owned());
    let match_type = properties.rank.and_then(|rank| non_blank(rank.match_type));

    let details = PlaceDetails {
        display_name: Some(display_name),
        street_address: Some(street_address),
        city: non_blank(properties.city),
        state: non_blank(properties.state),
        postcode: non_blank(properties.postcode),
        country_code: non_blank(properties.country_code),
        result_type: non_blank(properties.result_type),
        category: non_blank(properties.category),
        plus_code: non_blank(properties.plus_code),
        match_type: match_type.clone(),
        ..PlaceDetails::default()
    };
    Ok(ParsedLocation::new(lat, lon)
        .with_precision(match_type)
        .with_details(details))
}
