//! Error types for the annotation core and its collaborators

use thiserror::Error;

/// Geometric and input-validation failures. These reach the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Reference latitude too close to a pole for the planar approximation
    #[error("latitude {lat} is too close to a pole for a planar projection")]
    DegenerateProjection { lat: f64 },

    /// Centroid requested for a ring with no vertices
    #[error("boundary ring has no points")]
    EmptyRing,

    /// Coordinate outside the WGS84 range
    #[error("coordinate ({lat}, {lng}) is outside the WGS84 range")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// Boundary provider failure. Treated the same as "no boundary found".
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("boundary request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("boundary service returned status {0}")]
    Status(u16),

    #[error("boundary service error: {0}")]
    Service(String),
}

/// Image source failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image service returned status {0}")]
    Status(u16),

    #[error("image service returned an empty body")]
    Empty,
}

/// Failure to produce an annotated tile for one address
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Decode, draw or encode failure while annotating an image.
///
/// Never escapes [`crate::render::rasterize`]; the original bytes are returned instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
}
