//! Great-circle distance and proximity search.
//!
//! Distances use the haversine formula on a spherical Earth. The radii below
//! are the classic "surveyor" figures rather than the WGS84 mean radius, so
//! results differ slightly from ellipsoidal calculations.

/// Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3956.0;

/// Earth radius in kilometres.
pub const EARTH_RADIUS_KILOMETERS: f64 = 6367.0;

/// Unit for distance results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DistanceUnit {
    /// Statute miles.
    #[default]
    Miles,
    /// Kilometres.
    Kilometers,
}

impl DistanceUnit {
    /// Earth radius expressed in this unit.
    #[must_use]
    pub fn earth_radius(self) -> f64 {
        match self {
            Self::Miles => EARTH_RADIUS_MILES,
            Self::Kilometers => EARTH_RADIUS_KILOMETERS,
        }
    }

    /// Return the unit as a lowercase `&str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Miles => "miles",
            Self::Kilometers => "kilometers",
        }
    }
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(Self::Miles),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Ok(Self::Kilometers),
            _ => Err(format!("unknown distance unit '{s}'")),
        }
    }
}

/// Convert degrees to radians.
#[must_use]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Difference between two angles, converted to radians.
#[must_use]
pub fn diff_radians(first: f64, second: f64) -> f64 {
    to_radians(second) - to_radians(first)
}

/// Haversine distance between two positions given in degrees.
///
/// The `asin` argument is clamped to 1 so rounding error on antipodal
/// points cannot produce `NaN`.
///
/// # Examples
/// ```
/// use locus_core::{DistanceUnit, haversine_distance};
///
/// let d = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522, DistanceUnit::Kilometers);
/// assert!((d - 343.0).abs() < 2.0);
/// assert_eq!(haversine_distance(10.0, 20.0, 10.0, 20.0, DistanceUnit::Miles), 0.0);
/// ```
#[must_use]
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64, unit: DistanceUnit) -> f64 {
    let d_lat = diff_radians(lat1, lat2);
    let d_lng = diff_radians(lng1, lng2);
    let half_lat = (d_lat / 2.0).sin();
    let half_lng = (d_lng / 2.0).sin();
    let a = half_lat * half_lat
        + to_radians(lat1).cos() * to_radians(lat2).cos() * half_lng * half_lng;
    2.0 * unit.earth_radius() * a.sqrt().min(1.0).asin()
}

/// Anything with a latitude and longitude in degrees.
pub trait Positioned {
    /// Latitude in degrees.
    fn latitude(&self) -> f64;
    /// Longitude in degrees.
    fn longitude(&self) -> f64;

    /// Distance from `self` to `other`.
    fn distance_to<P: Positioned + ?Sized>(&self, other: &P, unit: DistanceUnit) -> f64 {
        haversine_distance(
            self.latitude(),
            self.longitude(),
            other.latitude(),
            other.longitude(),
            unit,
        )
    }
}

impl Positioned for crate::Coordinate {
    fn latitude(&self) -> f64 {
        self.lat()
    }

    fn longitude(&self) -> f64 {
        self.lng()
    }
}

impl Positioned for (f64, f64) {
    fn latitude(&self) -> f64 {
        self.0
    }

    fn longitude(&self) -> f64 {
        self.1
    }
}

impl<T: Positioned + ?Sized> Positioned for &T {
    fn latitude(&self) -> f64 {
        (**self).latitude()
    }

    fn longitude(&self) -> f64 {
        (**self).longitude()
    }
}

/// Points within `max_distance_miles` of `center`, in input order.
///
/// The boundary is inclusive. `limit` caps the number of matches; `None`
/// means unbounded.
///
/// # Examples
/// ```
/// use locus_core::find_within_radius;
///
/// let points = [(0.0, 0.0), (0.0, 1.0), (0.0, 10.0)];
/// let near = find_within_radius(&points, &(0.0, 0.0), 100.0, None);
/// assert_eq!(near, vec![&(0.0, 0.0), &(0.0, 1.0)]);
/// ```
pub fn find_within_radius<'a, T, C>(
    points: &'a [T],
    center: &C,
    max_distance_miles: f64,
    limit: Option<usize>,
) -> Vec<&'a T>
where
    T: Positioned,
    C: Positioned + ?Sized,
{
    points
        .iter()
        .filter(|point| point.distance_to(center, DistanceUnit::Miles) <= max_distance_miles)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// The point closest to `center` and its distance in `unit`.
///
/// The first point seeds the search and ties keep the earliest point. An
/// empty slice yields `None`.
///
/// # Examples
/// ```
/// use locus_core::{DistanceUnit, find_nearest};
///
/// let points = [(0.0, 5.0), (0.0, 1.0), (0.0, -1.0)];
/// let (nearest, _) = find_nearest(&points, &(0.0, 0.0), DistanceUnit::Miles).unwrap();
/// assert_eq!(nearest, &(0.0, 1.0));
/// assert!(find_nearest::<(f64, f64), _>(&[], &(0.0, 0.0), DistanceUnit::Miles).is_none());
/// ```
pub fn find_nearest<'a, T, C>(points: &'a [T], center: &C, unit: DistanceUnit) -> Option<(&'a T, f64)>
where
    T: Positioned,
    C: Positioned + ?Sized,
{
    let mut iter = points.iter();
    let first = iter.next()?;
    let seed = (first, first.distance_to(center, unit));
    Some(iter.fold(seed, |best, point| {
        let distance = point.distance_to(center, unit);
        if distance < best.1 {
            (point, distance)
        } else {
            best
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const TOLERANCE: f64 = 1.0e-9;

    #[rstest]
    #[case(DistanceUnit::Miles, 3956.0)]
    #[case(DistanceUnit::Kilometers, 6367.0)]
    fn radius_matches_unit(#[case] unit: DistanceUnit, #[case] expected: f64) {
        assert_eq!(unit.earth_radius(), expected);
    }

    #[rstest]
    #[case("mi", DistanceUnit::Miles)]
    #[case("KM", DistanceUnit::Kilometers)]
    #[case("kilometres", DistanceUnit::Kilometers)]
    fn parses_unit_names(#[case] raw: &str, #[case] expected: DistanceUnit) {
        assert_eq!(raw.parse::<DistanceUnit>(), Ok(expected));
    }

    #[test]
    fn quarter_meridian_is_a_quarter_circumference() {
        let d = haversine_distance(0.0, 0.0, 90.0, 0.0, DistanceUnit::Kilometers);
        let expected = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KILOMETERS;
        assert!((d - expected).abs() < 1.0e-6, "got {d}");
    }

    #[test]
    fn antipodal_points_do_not_overflow_asin() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0, DistanceUnit::Miles);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1.0e-6);
    }

    #[test]
    fn within_radius_is_inclusive_and_limited() {
        let center = (0.0, 0.0);
        let edge = haversine_distance(0.0, 0.0, 0.0, 1.0, DistanceUnit::Miles);
        let points = [(0.0, 1.0), (0.0, 0.5), (0.0, 2.0), (0.0, -1.0)];

        let all = find_within_radius(&points, &center, edge, None);
        assert_eq!(all, vec![&(0.0, 1.0), &(0.0, 0.5), &(0.0, -1.0)]);

        let limited = find_within_radius(&points, &center, edge, Some(2));
        assert_eq!(limited, vec![&(0.0, 1.0), &(0.0, 0.5)]);
    }

    #[test]
    fn nearest_measures_from_the_query_point() {
        let points = [(10.0, 10.0), (1.0, 1.0), (5.0, 5.0)];
        let (nearest, distance) =
            find_nearest(&points, &(0.0, 0.0), DistanceUnit::Miles).expect("non-empty input");
        assert_eq!(nearest, &(1.0, 1.0));
        assert!(distance > 0.0);
    }

    #[test]
    fn nearest_keeps_earliest_on_ties() {
        let points = [(0.0, 1.0), (0.0, -1.0)];
        let (nearest, _) =
            find_nearest(&points, &(0.0, 0.0), DistanceUnit::Miles).expect("non-empty input");
        assert_eq!(nearest, &(0.0, 1.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn distance_to_self_is_zero(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            prop_assert_eq!(haversine_distance(lat, lng, lat, lng, DistanceUnit::Miles), 0.0);
            prop_assert_eq!(haversine_distance(lat, lng, lat, lng, DistanceUnit::Kilometers), 0.0);
        }

        #[test]
        fn distance_is_symmetric(
            lat1 in -90.0f64..=90.0,
            lng1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0,
            lng2 in -180.0f64..=180.0,
        ) {
            for unit in [DistanceUnit::Miles, DistanceUnit::Kilometers] {
                let forward = haversine_distance(lat1, lng1, lat2, lng2, unit);
                let backward = haversine_distance(lat2, lng2, lat1, lng1, unit);
                prop_assert!((forward - backward).abs() <= TOLERANCE * unit.earth_radius());
            }
        }
    }
}
