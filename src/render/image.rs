//! Overlay rendering using tiny-skia
//!
//! These functions draw boundary outlines or the fallback marker onto decoded
//! satellite tiles and re-encode the result.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::geometry::{self, boundary, marker};
use super::projection::ProjectionScale;
use crate::config::{OutputFormat, OverlayStyle, RenderOptions, ShapeColor};
use crate::domain::{GeoPoint, Overlay, PixelRing, Ring};
use crate::error::RenderError;

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) -> Result<(), RenderError> {
    let (width, height) = (img.width(), img.height());
    let pixmap = tiny_skia::IntSize::from_wh(width, height)
        .and_then(|size| Pixmap::from_vec(img.as_raw().clone(), size));
    let Some(mut pixmap) = pixmap else {
        return Err(RenderError::Canvas { width, height });
    };

    f(&mut pixmap);

    // Copy back
    img.copy_from_slice(pixmap.data());
    Ok(())
}

fn solid_paint(color: ShapeColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Build a closed outline through the ring's vertices
fn build_ring_path(ring: &PixelRing) -> Option<tiny_skia::Path> {
    let (first, rest) = ring.points().split_first()?;

    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

/// Draw closed ring outlines onto an image
pub fn draw_boundary_on_image(
    img: &mut RgbaImage,
    rings: &[PixelRing],
    style: &OverlayStyle,
) -> Result<(), RenderError> {
    if rings.is_empty() {
        return Ok(());
    }

    with_pixmap(img, |pixmap| {
        let paint = solid_paint(style.boundary_color);
        let stroke = Stroke {
            width: boundary::THICKNESS,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };

        for ring in rings.iter().filter(|r| r.is_drawable()) {
            if let Some(path) = build_ring_path(ring) {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    })
}

/// Draw the no-boundary marker: a filled dot with an outline, at the image midpoint
pub fn draw_marker_on_image(img: &mut RgbaImage, style: &OverlayStyle) -> Result<(), RenderError> {
    let (cx, cy) = geometry::marker_center(img.width(), img.height());

    with_pixmap(img, |pixmap| {
        if let Some(dot) = PathBuilder::from_circle(cx, cy, marker::RADIUS) {
            let paint = solid_paint(style.marker_color);
            pixmap.fill_path(
                &dot,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }

        // Keep the outline inside the dot's radius
        let outline_radius = marker::RADIUS - marker::OUTLINE / 2.0;
        if let Some(ring) = PathBuilder::from_circle(cx, cy, outline_radius) {
            let paint = solid_paint(style.marker_outline_color);
            let stroke = Stroke {
                width: marker::OUTLINE,
                ..Default::default()
            };
            pixmap.stroke_path(&ring, &paint, &stroke, Transform::identity(), None);
        }
    })
}

/// Draw an overlay onto an image
pub fn draw_overlay(
    img: &mut RgbaImage,
    overlay: &Overlay,
    style: &OverlayStyle,
) -> Result<(), RenderError> {
    match overlay {
        Overlay::Boundary(rings) => draw_boundary_on_image(img, rings, style),
        Overlay::Marker => draw_marker_on_image(img, style),
    }
}

/// Decide what to draw: projected outlines, or the marker when there are no rings
pub fn plan_overlay(
    rings: &[Ring],
    image_center: GeoPoint,
    scale: &ProjectionScale,
    image_size_px: u32,
) -> Overlay {
    if rings.is_empty() {
        Overlay::Marker
    } else {
        Overlay::Boundary(geometry::project_rings(
            rings,
            image_center,
            scale,
            image_size_px,
        ))
    }
}

/// Decode any supported raster and normalize it to opaque RGBA.
///
/// Going through RGB first drops any alpha channel, so the pixmap's
/// premultiplied representation matches the straight RGBA bytes.
pub fn decode_normalized(bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb: RgbImage = decoded.to_rgb8();
    Ok(DynamicImage::ImageRgb8(rgb).to_rgba8())
}

/// Encode an annotated image as 3-channel output
pub fn encode(img: RgbaImage, format: OutputFormat) -> Result<Vec<u8>, RenderError> {
    let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
    let mut out = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg { quality } => {
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)?;
        }
        OutputFormat::Png => rgb.write_to(&mut out, ImageFormat::Png)?,
    }
    Ok(out.into_inner())
}

/// Edge length used to project rings, so outlines share the marker's frame.
///
/// A square tile of a different size than requested is projected at its actual
/// size. Anything else keeps the requested size.
fn frame_size(img: &RgbaImage, requested_px: u32) -> u32 {
    let (width, height) = img.dimensions();
    if width == requested_px && height == requested_px {
        return requested_px;
    }
    if width == height {
        log::warn!("Tile is {width}px, expected {requested_px}px; projecting at {width}px");
        width
    } else {
        log::warn!(
            "Tile is {width}x{height}, expected a {requested_px}px square; outlines may be offset"
        );
        requested_px
    }
}

fn try_rasterize(
    image: &[u8],
    rings: &[Ring],
    image_center: GeoPoint,
    scale: &ProjectionScale,
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let mut img = decode_normalized(image)?;
    let size_px = frame_size(&img, options.image_size_px);
    let overlay = plan_overlay(rings, image_center, scale, size_px);
    draw_overlay(&mut img, &overlay, &options.style)?;
    encode(img, options.format)
}

/// Draw `rings` (or the fallback marker when empty) onto an encoded image.
///
/// Annotation is best-effort: if the bytes cannot be decoded, drawn on or
/// re-encoded, the input is returned unchanged.
pub fn rasterize_with(
    image: &[u8],
    rings: &[Ring],
    image_center: GeoPoint,
    scale: &ProjectionScale,
    options: &RenderOptions,
) -> Vec<u8> {
    match try_rasterize(image, rings, image_center, scale, options) {
        Ok(annotated) => annotated,
        Err(err) => {
            log::warn!("Could not annotate image, keeping original: {err}");
            image.to_vec()
        }
    }
}

/// [`rasterize_with`] using the default overlay style and output encoding
pub fn rasterize(
    image: &[u8],
    rings: &[Ring],
    image_center: GeoPoint,
    scale: &ProjectionScale,
    image_size_px: u32,
) -> Vec<u8> {
    let options = RenderOptions {
        image_size_px,
        ..RenderOptions::default()
    };
    rasterize_with(image, rings, image_center, scale, &options)
}
