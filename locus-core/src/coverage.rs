//! Point-in-polygon tests for coverage areas.
//!
//! Containment uses even-odd ray casting. Rings are closed: the last point
//! repeats the first, so a ring of `n` points has `n - 1` vertices. Points
//! that lie exactly on an edge follow whatever the crossing count yields;
//! for the square `[(0,0),(0,10),(10,10),(10,0),(0,0)]` the edge point
//! `(0,5)` counts as inside.

use crate::Coordinate;

/// Smallest ring that encloses any area: three vertices plus the closing point.
pub const MIN_RING_POINTS: usize = 4;

/// A closed outer ring with optional exclusion polygons carved out of it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Polygon {
    /// Outer ring; the first point is repeated as the last.
    pub coordinates: Vec<Coordinate>,
    /// Holes. A point inside any of them is not covered by this polygon.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusionary_polygons: Vec<Polygon>,
}

impl Polygon {
    /// Build a polygon without exclusions.
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            coordinates,
            exclusionary_polygons: Vec::new(),
        }
    }

    /// Add an exclusion polygon.
    #[must_use]
    pub fn with_exclusion(mut self, exclusion: Polygon) -> Self {
        self.exclusionary_polygons.push(exclusion);
        self
    }

    /// Whether `point` lies inside the outer ring and outside every exclusion.
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        point_in_polygon(self, point)
    }
}

/// Ordered polygons; a point is covered when any of them contains it.
pub type CoverageArea = Vec<Polygon>;

/// Even-odd ray casting against a single closed ring.
///
/// Rings with fewer than [`MIN_RING_POINTS`] points never contain anything.
#[must_use]
pub fn point_in_ring(ring: &[Coordinate], point: &Coordinate) -> bool {
    if ring.len() < MIN_RING_POINTS {
        return false;
    }
    let vertices = &ring[..ring.len() - 1];
    let (lat, lng) = (point.lat(), point.lng());

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for (i, current) in vertices.iter().enumerate() {
        let previous = &vertices[j];
        let straddles = (current.lat() > lat) != (previous.lat() > lat);
        if straddles {
            let crossing = (previous.lng() - current.lng()) * (lat - current.lat())
                / (previous.lat() - current.lat())
                + current.lng();
            if lng < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Containment in a polygon, honouring (possibly nested) exclusions.
///
/// # Examples
/// ```
/// use locus_core::{Coordinate, Polygon, point_in_polygon};
///
/// # fn main() -> Result<(), locus_core::CoordinateError> {
/// let ring = |points: &[(f64, f64)]| -> Result<Vec<Coordinate>, locus_core::CoordinateError> {
///     points.iter().map(|&(lat, lng)| Coordinate::new(lat, lng)).collect()
/// };
/// let square = Polygon::new(ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)])?)
///     .with_exclusion(Polygon::new(ring(&[(4.0, 4.0), (4.0, 6.0), (6.0, 6.0), (6.0, 4.0), (4.0, 4.0)])?));
///
/// assert!(!point_in_polygon(&square, &Coordinate::new(5.0, 5.0)?));
/// assert!(point_in_polygon(&square, &Coordinate::new(1.0, 1.0)?));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn point_in_polygon(polygon: &Polygon, point: &Coordinate) -> bool {
    point_in_ring(&polygon.coordinates, point)
        && !polygon
            .exclusionary_polygons
            .iter()
            .any(|exclusion| point_in_polygon(exclusion, point))
}

/// Whether any polygon of `areas` contains `point`. Stops at the first match.
#[must_use]
pub fn point_in_any_coverage_area(point: &Coordinate, areas: &[Polygon]) -> bool {
    areas.iter().any(|polygon| point_in_polygon(polygon, point))
}

impl From<&Polygon> for geo::Polygon<f64> {
    /// Outer ring becomes the exterior and each exclusion's outer ring an
    /// interior. Nested exclusions are flattened away.
    fn from(value: &Polygon) -> Self {
        let exterior: geo::LineString<f64> = value
            .coordinates
            .iter()
            .map(geo::Coord::<f64>::from)
            .collect();
        let interiors = value
            .exclusionary_polygons
            .iter()
            .map(|hole| hole.coordinates.iter().map(geo::Coord::<f64>::from).collect())
            .collect();
        geo::Polygon::new(exterior, interiors)
    }
}
