//! Geo-to-pixel conversion and overlay geometry
//!
//! Projects boundary rings onto a square tile whose center pixel corresponds to
//! the image center, and holds the sizes used when drawing the overlay.

use super::projection::ProjectionScale;
use crate::domain::{GeoPoint, PixelPoint, PixelRing, Ring};

/// Boundary outline geometry
pub mod boundary {
    /// Outline stroke width in pixels
    pub const THICKNESS: f32 = 4.0;
}

/// Fallback marker geometry
pub mod marker {
    /// Dot radius in pixels, including the outline
    pub const RADIUS: f32 = 15.0;
    /// Outline width in pixels
    pub const OUTLINE: f32 = 2.0;
}

/// Project one geographic point into image pixels.
///
/// The fractional part is dropped toward zero, matching an integer cast.
#[inline]
pub fn to_pixel(
    point: GeoPoint,
    image_center: GeoPoint,
    scale: &ProjectionScale,
    image_size_px: u32,
) -> PixelPoint {
    let half = f64::from(image_size_px) / 2.0;
    let x = half + (point.lng - image_center.lng) / scale.lng_degrees_per_pixel;
    // Image y grows downward while latitude grows northward
    let y = half - (point.lat - image_center.lat) / scale.lat_degrees_per_pixel;
    PixelPoint::new(x as i32, y as i32)
}

/// Project every vertex of a ring
pub fn project_ring(
    ring: &Ring,
    image_center: GeoPoint,
    scale: &ProjectionScale,
    image_size_px: u32,
) -> PixelRing {
    PixelRing(
        ring.points()
            .iter()
            .map(|&p| to_pixel(p, image_center, scale, image_size_px))
            .collect(),
    )
}

/// Project all rings, dropping those with fewer than three points
pub fn project_rings(
    rings: &[Ring],
    image_center: GeoPoint,
    scale: &ProjectionScale,
    image_size_px: u32,
) -> Vec<PixelRing> {
    rings
        .iter()
        .map(|ring| project_ring(ring, image_center, scale, image_size_px))
        .filter(PixelRing::is_drawable)
        .collect()
}

/// Marker center for an image of the given dimensions
#[inline]
pub fn marker_center(width: u32, height: u32) -> (f32, f32) {
    (width as f32 / 2.0, height as f32 / 2.0)
}

/// Bounding box (min_x, min_y, max_x, max_y) the marker may touch
#[inline]
pub fn marker_bounds(width: u32, height: u32) -> (f32, f32, f32, f32) {
    let (cx, cy) = marker_center(width, height);
    let r = marker::RADIUS;
    (cx - r, cy - r, cx + r, cy + r)
}
