//! Validated latitude/longitude pairs.
//!
//! A [`Coordinate`] always lies inside the WGS84 range. The geocoders treat
//! `(0, 0)` as "not found" but the type itself accepts it, because polygon
//! rings and distance queries legitimately use the origin.

use geo::{Coord, Point};
use thiserror::Error;

use crate::ProviderKind;

/// Errors returned by [`Coordinate::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude was outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude was outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Return `true` when `latitude` lies in `[-90, 90]`.
#[must_use]
pub fn is_valid_latitude(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

/// Return `true` when `longitude` lies in `[-180, 180]`.
#[must_use]
pub fn is_valid_longitude(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

/// Check a raw position, optionally rejecting the `(0, 0)` sentinel.
///
/// # Examples
/// ```
/// use locus_core::is_valid_position;
///
/// assert!(is_valid_position(38.8977, -77.0365, true));
/// assert!(!is_valid_position(0.0, 0.0, true));
/// assert!(is_valid_position(0.0, 0.0, false));
/// assert!(!is_valid_position(91.0, 0.0, false));
/// ```
#[must_use]
pub fn is_valid_position(latitude: f64, longitude: f64, treat_zero_as_invalid: bool) -> bool {
    is_valid_latitude(latitude)
        && is_valid_longitude(longitude)
        && !(treat_zero_as_invalid && latitude == 0.0 && longitude == 0.0)
}

/// A geographic position with optional provider metadata.
///
/// The precision string is opaque: each provider reports a different kind of
/// indicator (match score, location type, quality code).
///
/// # Examples
/// ```
/// use locus_core::{Coordinate, ProviderKind};
///
/// # fn main() -> Result<(), locus_core::CoordinateError> {
/// let coordinate = Coordinate::new(38.8977, -77.0365)?
///     .with_provider(ProviderKind::Osm)
///     .with_precision("office_government");
/// assert_eq!(coordinate.provider(), ProviderKind::Osm);
/// assert_eq!(coordinate.precision(), Some("office_government"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "CoordinateRecord")
)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
    precision: Option<String>,
    provider: ProviderKind,
}

impl Coordinate {
    /// Validates and constructs a [`Coordinate`] with no provider metadata.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !is_valid_latitude(lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !is_valid_longitude(lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self {
            lat,
            lng,
            precision: None,
            provider: ProviderKind::Unknown,
        })
    }

    /// Attach the provider-specific precision indicator.
    #[must_use]
    pub fn with_precision(mut self, precision: impl Into<String>) -> Self {
        self.precision = Some(precision.into());
        self
    }

    /// Tag the coordinate with the provider that produced it.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Provider-specific precision indicator, if any.
    #[must_use]
    pub fn precision(&self) -> Option<&str> {
        self.precision.as_deref()
    }

    /// Provider that produced the coordinate.
    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Whether this is the `(0, 0)` sentinel geocoders use for "nothing found".
    #[must_use]
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    /// Link to the position on Google Maps.
    #[must_use]
    pub fn google_maps_url(&self) -> String {
        format!("https://maps.google.com/maps?q={},{}", self.lat, self.lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Lat={}|Long={}|Src={}|Precision={}",
            self.lat,
            self.lng,
            self.provider,
            self.precision.as_deref().unwrap_or_default()
        )
    }
}

impl From<&Coordinate> for Coord<f64> {
    fn from(value: &Coordinate) -> Self {
        Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

impl From<&Coordinate> for Point<f64> {
    fn from(value: &Coordinate) -> Self {
        Point(Coord::from(value))
    }
}

impl TryFrom<Coord<f64>> for Coordinate {
    type Error = CoordinateError;

    /// Interpret `x` as longitude and `y` as latitude.
    fn try_from(value: Coord<f64>) -> Result<Self, Self::Error> {
        Self::new(value.y, value.x)
    }
}

/// Unvalidated wire shape used when deserialising a [`Coordinate`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct CoordinateRecord {
    lat: f64,
    lng: f64,
    #[serde(default)]
    precision: Option<String>,
    #[serde(default)]
    provider: ProviderKind,
}

#[cfg(feature = "serde")]
impl TryFrom<CoordinateRecord> for Coordinate {
    type Error = CoordinateError;

    fn try_from(record: CoordinateRecord) -> Result<Self, Self::Error> {
        let mut coordinate = Self::new(record.lat, record.lng)?.with_provider(record.provider);
        coordinate.precision = record.precision;
        Ok(coordinate)
    }
}
