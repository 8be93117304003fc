//! Facade crate for the Locus geocoding engine.
//!
//! This crate re-exports the core domain types and geometry, and exposes the
//! HTTP provider clients behind the `http` feature flag.

#![forbid(unsafe_code)]

pub use locus_core::{
    Coordinate, CoordinateError, CoverageArea, DistanceUnit, FailureKind, GeocodeError,
    GeocodeRequest, GeocodeResult, GeocodeSuccess, PlaceDetails, Polygon, ProviderFailure,
    ProviderKind, find_nearest, find_within_radius, haversine_distance,
    point_in_any_coverage_area, point_in_polygon, plus_code,
};

#[cfg(feature = "http")]
pub use locus_data::{
    BlockingGeocoder, CancellationToken, GeocodeOrchestrator, Geocoder, GeocoderConfig,
    ProviderClient, ProviderSettings, RateLimiter, RateLimiterRegistry, ReqwestTransport,
    Strategy,
};
