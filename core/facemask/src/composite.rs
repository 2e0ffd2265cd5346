use std::path::Path;

use image::{DynamicImage, RgbImage, RgbaImage};
use log::{debug, warn};

use crate::error::FaceMaskError;
use crate::geometry::Face;
use crate::glyph::{GlyphRasterizer, GlyphTarget, RenderedGlyph};
use crate::palette::Palette;

/// Decode the image at `path`, rejecting images with a zero dimension.
pub(crate) fn decode_image(path: &Path) -> Result<DynamicImage, FaceMaskError> {
    let image = image::open(path)
        .map_err(|e| FaceMaskError::DecodeError(format!("{}: {e}", path.display())))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(FaceMaskError::ZeroDimensions);
    }
    Ok(image)
}

/// Flatten alpha channel by compositing onto a white background.
pub(crate) fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    let rgba: RgbaImage = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let out = blend_channels([255, 255, 255], [r, g, b], a);
        rgb.put_pixel(x, y, image::Rgb(out));
    }

    rgb
}

/// `src` over `dst` with straight alpha `alpha`.
fn blend_channels(dst: [u8; 3], src: [u8; 3], alpha: u8) -> [u8; 3] {
    let alpha = alpha as f32 / 255.0;
    let inv_alpha = 1.0 - alpha;
    let mix = |d: u8, s: u8| (s as f32 * alpha + d as f32 * inv_alpha).round() as u8;
    [mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2])]
}

/// Draw the base image and one glyph per face on a canvas of the base's size.
///
/// Faces are drawn in slice order, so a later face covers an earlier one where
/// their boxes overlap. Face `i` gets `palette.select(i)`, sized to its box
/// width and centered in the box. Faces without vertices are skipped but keep
/// their index. Zero-width boxes and boxes whose glyph cannot reach the
/// canvas draw nothing.
pub fn compose_overlay(
    base: &DynamicImage,
    faces: &[Face],
    palette: &Palette,
    rasterizer: &dyn GlyphRasterizer,
) -> Result<RgbImage, FaceMaskError> {
    let mut raster = flatten_alpha(base);
    let canvas = raster.dimensions();

    for (index, face) in faces.iter().enumerate() {
        let Some(bbox) = face.bounding_box() else {
            warn!("face {index} has no vertices, skipping");
            continue;
        };
        let glyph = palette.select(index);
        debug!(
            "face {index}: box=({}, {}, {}x{}) glyph={glyph}",
            bbox.x, bbox.y, bbox.width, bbox.height
        );

        if bbox.width <= 0.0 {
            continue;
        }

        let target = GlyphTarget {
            size: bbox.width as f32,
            anchor: bbox.center(),
            canvas,
        };
        if !reaches_canvas(&target) {
            debug!("face {index} lies outside the image, skipping");
            continue;
        }

        let rendered = rasterizer.rasterize_visible(glyph, &target)?;
        draw_glyph(&mut raster, &rendered, target.anchor);
    }

    Ok(raster)
}

/// Whether a glyph of `target.size` could touch the canvas. Ink may spill past
/// the em square, so the test allows one full em on every side of the anchor.
fn reaches_canvas(target: &GlyphTarget) -> bool {
    let reach = f64::from(target.size);
    let (x, y) = target.anchor;
    let (width, height) = (f64::from(target.canvas.0), f64::from(target.canvas.1));
    x + reach > 0.0 && x - reach < width && y + reach > 0.0 && y - reach < height
}

/// Composite `glyph` so that its center lands on `anchor`, clipped to the raster.
fn draw_glyph(raster: &mut RgbImage, glyph: &RenderedGlyph, anchor: (f64, f64)) {
    if glyph.is_empty() {
        return;
    }

    let left = (anchor.0 - glyph.center.0).round() as i64;
    let top = (anchor.1 - glyph.center.1).round() as i64;
    let (width, height) = (raster.width() as i64, raster.height() as i64);

    for (gx, gy, pixel) in glyph.image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        let (x, y) = (left + gx as i64, top + gy as i64);
        if x < 0 || y < 0 || x >= width || y >= height {
            continue;
        }
        let target = raster.get_pixel_mut(x as u32, y as u32);
        target.0 = blend_channels(target.0, [r, g, b], a);
    }
}
