//! Annotation pipeline
//!
//! The boundary is always looked up at the geocoded address point, which is
//! stable between runs, while the tile is centered on the boundary's centroid so
//! the lot sits in the middle of the frame even when the geocoder lands near one
//! edge of it. Pixel offsets are therefore measured from the tile center, not
//! from the query point.

use crate::cadastre::{self, BoundaryProvider};
use crate::capture::ImageSource;
use crate::config::RenderOptions;
use crate::domain::{Boundary, GeoPoint};
use crate::error::{FrameError, GeoError};
use crate::render;

/// Annotate a tile centered at `image_center` with the boundary found at
/// `query_point`, or with the fallback marker if there is none.
///
/// Makes exactly one provider call. Lookup failures fall back to the marker;
/// only projection errors reach the caller.
pub fn annotate(
    provider: &dyn BoundaryProvider,
    query_point: GeoPoint,
    image_center: GeoPoint,
    base_image: &[u8],
    options: &RenderOptions,
) -> Result<Vec<u8>, GeoError> {
    // Validate the projection before spending a network call
    let scale = render::scale(options.zoom, image_center.lat)?;
    let boundary = cadastre::lookup_or_empty(provider, query_point);
    Ok(render::rasterize_with(
        base_image,
        boundary.rings(),
        image_center,
        &scale,
        options,
    ))
}

/// Annotate a tile with a boundary the caller already fetched
pub fn annotate_with_boundary(
    boundary: &Boundary,
    image_center: GeoPoint,
    base_image: &[u8],
    options: &RenderOptions,
) -> Result<Vec<u8>, GeoError> {
    let scale = render::scale(options.zoom, image_center.lat)?;
    Ok(render::rasterize_with(
        base_image,
        boundary.rings(),
        image_center,
        &scale,
        options,
    ))
}

/// Where to center the tile: the outer ring's centroid, else the query point
pub fn frame_center(boundary: &Boundary, query_point: GeoPoint) -> GeoPoint {
    match boundary.outer().map(|ring| ring.centroid()) {
        Some(Ok(center)) => {
            log::debug!("Property centroid: ({:.6}, {:.6})", center.lat, center.lng);
            center
        }
        Some(Err(err)) => {
            log::debug!("Cannot center on boundary ({err}), using geocoded point");
            query_point
        }
        None => query_point,
    }
}

/// An annotated tile ready for classification
#[derive(Debug, Clone)]
pub struct FramedProperty {
    /// Encoded, annotated image
    pub image: Vec<u8>,
    /// Geographic point at the tile's center pixel
    pub image_center: GeoPoint,
    /// Whether a parcel boundary was found (otherwise the marker was drawn)
    pub has_boundary: bool,
}

/// Look up the boundary once, fetch a tile centered on the lot and annotate it
pub fn frame_property(
    provider: &dyn BoundaryProvider,
    images: &dyn ImageSource,
    query_point: GeoPoint,
    options: &RenderOptions,
) -> Result<FramedProperty, FrameError> {
    let boundary = cadastre::lookup_or_empty(provider, query_point);
    let image_center = frame_center(&boundary, query_point);

    // Fail on a degenerate projection before fetching anything
    render::scale(options.zoom, image_center.lat)?;

    let base_image = images.fetch(image_center, options.zoom, options.image_size_px)?;
    let image = annotate_with_boundary(&boundary, image_center, &base_image, options)?;

    Ok(FramedProperty {
        image,
        image_center,
        has_boundary: !boundary.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ring;
    use crate::error::{FetchError, LookupError};
    use std::cell::{Cell, RefCell};

    struct CountingProvider {
        boundary: Boundary,
        calls: Cell<usize>,
        points: RefCell<Vec<GeoPoint>>,
    }

    impl CountingProvider {
        fn new(boundary: Boundary) -> Self {
            Self {
                boundary,
                calls: Cell::new(0),
                points: RefCell::new(Vec::new()),
            }
        }
    }

    impl BoundaryProvider for CountingProvider {
        fn lookup(&self, point: GeoPoint) -> Result<Boundary, LookupError> {
            self.calls.set(self.calls.get() + 1);
            self.points.borrow_mut().push(point);
            Ok(self.boundary.clone())
        }
    }

    struct RecordingSource {
        centers: RefCell<Vec<GeoPoint>>,
        fail: bool,
    }

    impl ImageSource for RecordingSource {
        fn fetch(&self, center: GeoPoint, _zoom: u8, _size_px: u32) -> Result<Vec<u8>, FetchError> {
            self.centers.borrow_mut().push(center);
            if self.fail {
                Err(FetchError::Status(403))
            } else {
                Ok(b"tile".to_vec())
            }
        }
    }

    fn lot() -> Boundary {
        Boundary::new(vec![Ring::from_lat_lng(&[
            (-36.0800, 146.9200),
            (-36.0800, 146.9204),
            (-36.0804, 146.9204),
            (-36.0804, 146.9200),
        ])])
    }

    #[test]
    fn test_annotate_single_lookup_at_query_point() {
        let provider = CountingProvider::new(lot());
        let query = GeoPoint::new(-36.0801, 146.9201);
        let center = GeoPoint::new(-36.0802, 146.9202);

        let out = annotate(&provider, query, center, b"junk", &RenderOptions::default()).unwrap();

        assert_eq!(provider.calls.get(), 1);
        assert_eq!(provider.points.borrow()[0], query);
        // Undecodable input comes back untouched
        assert_eq!(out, b"junk");
    }

    #[test]
    fn test_annotate_degenerate_projection_skips_lookup() {
        let provider = CountingProvider::new(lot());
        let pole = GeoPoint::new(89.95, 0.0);
        let err = annotate(&provider, pole, pole, b"junk", &RenderOptions::default()).unwrap_err();
        assert_eq!(err, GeoError::DegenerateProjection { lat: 89.95 });
        assert_eq!(provider.calls.get(), 0);
    }

    #[test]
    fn test_frame_center_uses_outer_centroid() {
        let query = GeoPoint::new(-36.0800, 146.9200);
        let center = frame_center(&lot(), query);
        assert!((center.lat - -36.0802).abs() < 1e-9);
        assert!((center.lng - 146.9202).abs() < 1e-9);
    }

    #[test]
    fn test_frame_center_falls_back() {
        let query = GeoPoint::new(-36.08, 146.92);
        assert_eq!(frame_center(&Boundary::not_found(), query), query);
        let empty_outer = Boundary::new(vec![Ring::default()]);
        assert_eq!(frame_center(&empty_outer, query), query);
    }

    #[test]
    fn test_frame_property_fetches_at_centroid() {
        let provider = CountingProvider::new(lot());
        let source = RecordingSource {
            centers: RefCell::new(Vec::new()),
            fail: false,
        };
        let query = GeoPoint::new(-36.0800, 146.9200);

        let framed =
            frame_property(&provider, &source, query, &RenderOptions::default()).unwrap();

        assert_eq!(provider.calls.get(), 1);
        assert!(framed.has_boundary);
        assert_eq!(source.centers.borrow()[0], framed.image_center);
        assert_ne!(framed.image_center, query);
    }

    #[test]
    fn test_frame_property_fetch_failure() {
        let provider = CountingProvider::new(Boundary::not_found());
        let source = RecordingSource {
            centers: RefCell::new(Vec::new()),
            fail: true,
        };
        let query = GeoPoint::new(-36.08, 146.92);

        let err = frame_property(&provider, &source, query, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, FrameError::Fetch(FetchError::Status(403))));
        assert_eq!(source.centers.borrow()[0], query);
    }
}
