//! Core domain types for the Locus geocoding engine.
//!
//! This crate holds the provider-neutral vocabulary ([`Coordinate`],
//! [`GeocodeRequest`], [`GeocodeError`]) and the pure geometry used by
//! proximity and coverage queries. Nothing here performs I/O; provider
//! clients and throttling live in `locus-data`.

pub mod coordinate;
pub mod coverage;
pub mod distance;
pub mod geocode;
pub mod plus_code;
pub mod provider;

pub use coordinate::{
    Coordinate, CoordinateError, is_valid_latitude, is_valid_longitude, is_valid_position,
};
pub use coverage::{
    CoverageArea, MIN_RING_POINTS, Polygon, point_in_any_coverage_area, point_in_polygon,
    point_in_ring,
};
pub use distance::{
    DistanceUnit, EARTH_RADIUS_KILOMETERS, EARTH_RADIUS_MILES, Positioned, diff_radians,
    find_nearest, find_within_radius, haversine_distance, to_radians,
};
pub use geocode::{
    FailureKind, GeocodeError, GeocodeRequest, GeocodeResult, GeocodeSuccess, MAX_ADDRESS_CHARS,
    NormalisedAddress, PlaceDetails, ProviderFailure,
};
pub use provider::ProviderKind;
