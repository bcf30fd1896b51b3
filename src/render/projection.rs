//! Web Mercator tile scale factors
//!
//! Converts between meters, degrees and pixels for a square tile centered at a
//! given latitude. The factors are treated as constant across the tile, which is
//! accurate to well under a pixel for the few hundred meters a tile covers at
//! residential zoom levels.

use crate::error::GeoError;

/// Equatorial circumference of the earth in meters
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Meters per degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Largest |latitude| the planar approximation accepts
pub const MAX_LATITUDE: f64 = 89.9;

/// Tile edge in pixels at zoom 0 is 2^8
const TILE_SIZE_LOG2: i32 = 8;

/// Scale factors for one image center
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionScale {
    pub meters_per_pixel: f64,
    pub lat_degrees_per_pixel: f64,
    pub lng_degrees_per_pixel: f64,
}

/// Compute scale factors for `zoom` at `image_center_lat`
pub fn scale(zoom: u8, image_center_lat: f64) -> Result<ProjectionScale, GeoError> {
    if !image_center_lat.is_finite() || image_center_lat.abs() > MAX_LATITUDE {
        return Err(GeoError::DegenerateProjection {
            lat: image_center_lat,
        });
    }

    let cos_lat = image_center_lat.to_radians().cos();
    let meters_per_pixel =
        EARTH_CIRCUMFERENCE_M * cos_lat / 2f64.powi(i32::from(zoom) + TILE_SIZE_LOG2);

    Ok(ProjectionScale {
        meters_per_pixel,
        lat_degrees_per_pixel: meters_per_pixel / METERS_PER_DEGREE,
        lng_degrees_per_pixel: meters_per_pixel / (METERS_PER_DEGREE * cos_lat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factors_positive() {
        for zoom in 0..=22u8 {
            let mut lat = -89.0;
            while lat <= 89.0 {
                let s = scale(zoom, lat).unwrap();
                assert!(s.meters_per_pixel > 0.0, "zoom {zoom} lat {lat}");
                assert!(s.lat_degrees_per_pixel > 0.0, "zoom {zoom} lat {lat}");
                assert!(s.lng_degrees_per_pixel > 0.0, "zoom {zoom} lat {lat}");
                lat += 0.5;
            }
        }
    }

    #[test]
    fn test_zoom_halves_meters_per_pixel() {
        for lat in [-60.0, -36.08, 0.0, 12.5, 51.5, 89.0] {
            for zoom in 0..22u8 {
                let coarse = scale(zoom, lat).unwrap();
                let fine = scale(zoom + 1, lat).unwrap();
                assert_eq!(fine.meters_per_pixel, coarse.meters_per_pixel / 2.0);
            }
        }
    }

    #[test]
    fn test_equator_zoom_20() {
        let s = scale(20, 0.0).unwrap();
        assert!((s.meters_per_pixel - 0.149_291_2).abs() < 1e-6);
        // At the equator a pixel spans the same angle in both directions
        assert!((s.lat_degrees_per_pixel - s.lng_degrees_per_pixel).abs() < 1e-15);
    }

    #[test]
    fn test_longitude_stretch_with_latitude() {
        let s = scale(20, 60.0).unwrap();
        // cos(60) = 0.5, so a pixel covers twice as many degrees of longitude
        assert!((s.lng_degrees_per_pixel / s.lat_degrees_per_pixel - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_near_pole() {
        assert!(scale(20, 89.9).is_ok());
        assert_eq!(
            scale(20, 89.95),
            Err(GeoError::DegenerateProjection { lat: 89.95 })
        );
        assert!(scale(20, -90.0).is_err());
        assert!(scale(20, f64::NAN).is_err());
    }
}
