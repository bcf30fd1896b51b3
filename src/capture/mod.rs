//! Satellite tile capture
//!
//! Image sources return a square, north-up Web Mercator tile centered exactly
//! on the requested point.

pub mod static_map;

use crate::domain::GeoPoint;
use crate::error::FetchError;

pub use static_map::StaticMapClient;

/// Source of satellite tiles
pub trait ImageSource {
    /// Fetch an encoded `size_px` x `size_px` tile centered at `center`
    fn fetch(&self, center: GeoPoint, zoom: u8, size_px: u32) -> Result<Vec<u8>, FetchError>;
}
