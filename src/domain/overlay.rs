//! Overlay types drawn onto satellite tiles
//!
//! All overlay coordinates are in image pixels.

use super::geometry::PixelPoint;

/// A boundary ring already projected into image space
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelRing(pub Vec<PixelPoint>);

impl PixelRing {
    pub fn points(&self) -> &[PixelPoint] {
        &self.0
    }

    /// Rings need at least three points to enclose anything
    pub fn is_drawable(&self) -> bool {
        self.0.len() >= 3
    }

    /// Mean pixel position of the ring's vertices
    pub fn mean(&self) -> Option<(f64, f64)> {
        if self.0.is_empty() {
            return None;
        }
        let n = self.0.len() as f64;
        let (sx, sy) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        Some((sx / n, sy / n))
    }
}

/// What gets drawn onto a tile
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Overlay {
    /// Closed outlines for each drawable ring
    Boundary(Vec<PixelRing>),
    /// Dot at the image midpoint, used when no boundary geometry exists
    Marker,
}
