//! Geographic and pixel-space coordinate types

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// A WGS84 coordinate in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a point without range checks
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a point, rejecting coordinates outside the WGS84 range
    pub fn checked(lat: f64, lng: f64) -> Result<Self, GeoError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(GeoError::InvalidCoordinate { lat, lng })
        }
    }

    /// Check that latitude is within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// One boundary loop. The last vertex implicitly connects back to the first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ring(pub Vec<GeoPoint>);

impl Ring {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    /// Build a ring from `(lat, lng)` pairs
    pub fn from_lat_lng(pairs: &[(f64, f64)]) -> Self {
        Self(pairs.iter().map(|&(lat, lng)| GeoPoint::new(lat, lng)).collect())
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unweighted mean of the vertex coordinates.
    ///
    /// This is a vertex average, not an area-weighted polygon centroid. Lot
    /// boundaries are small and roughly convex, so the two rarely differ by more
    /// than a few meters, but unevenly sampled rings will pull the result toward
    /// the denser side.
    pub fn centroid(&self) -> Result<GeoPoint, GeoError> {
        if self.0.is_empty() {
            return Err(GeoError::EmptyRing);
        }
        let n = self.0.len() as f64;
        let (sum_lat, sum_lng) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
        Ok(GeoPoint::new(sum_lat / n, sum_lng / n))
    }
}

/// Property boundary: the outer ring first, then any holes.
///
/// An empty boundary means no parcel was found at the query point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Boundary(pub Vec<Ring>);

impl Boundary {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self(rings)
    }

    pub fn not_found() -> Self {
        Self(Vec::new())
    }

    pub fn rings(&self) -> &[Ring] {
        &self.0
    }

    pub fn outer(&self) -> Option<&Ring> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Image-space coordinate, origin top-left, y growing downward
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Compute the framing center for a ring (see [`Ring::centroid`])
pub fn centroid(outer_ring: &Ring) -> Result<GeoPoint, GeoError> {
    outer_ring.centroid()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_of_square() {
        let ring = Ring::from_lat_lng(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
        assert_eq!(centroid(&ring).unwrap(), GeoPoint::new(1.0, 1.0));
    }

    #[test]
    fn test_centroid_empty_ring() {
        assert_eq!(centroid(&Ring::default()), Err(GeoError::EmptyRing));
    }

    #[test]
    fn test_centroid_is_vertex_average() {
        // Extra vertices on one side pull the average toward them
        let ring = Ring::from_lat_lng(&[
            (0.0, 0.0),
            (0.0, 1.0),
            (0.0, 2.0),
            (0.0, 3.0),
            (4.0, 3.0),
            (4.0, 0.0),
        ]);
        let c = ring.centroid().unwrap();
        assert!((c.lat - 4.0 / 3.0).abs() < 1e-12);
        assert!((c.lng - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_checked_point_range() {
        assert!(GeoPoint::checked(-36.08, 146.92).is_ok());
        assert!(GeoPoint::checked(91.0, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, -180.5).is_err());
        assert!(GeoPoint::checked(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_boundary_outer() {
        let outer = Ring::from_lat_lng(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let hole = Ring::from_lat_lng(&[(0.2, 0.2), (0.2, 0.4), (0.4, 0.4)]);
        let boundary = Boundary::new(vec![outer.clone(), hole]);
        assert_eq!(boundary.outer(), Some(&outer));
        assert!(Boundary::not_found().outer().is_none());
    }
}
