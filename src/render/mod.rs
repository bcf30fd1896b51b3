//! Boundary rendering module
//!
//! This module contains:
//! - Web Mercator scale factors for a tile center
//! - Geo-to-pixel projection and overlay geometry
//! - Image rendering using tiny-skia

pub mod geometry;
pub mod image;
pub mod projection;

pub use self::image::{draw_overlay, plan_overlay, rasterize, rasterize_with};
pub use projection::{ProjectionScale, scale};
