//! Glyph rasterization: turn one palette glyph into an RGBA image at a pixel size.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use skrifa::bitmap::{BitmapData, BitmapStrikes};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, GlyphId, MetadataProvider};
use zeno::{Command, Mask, Origin, Vector};

use crate::error::FaceMaskError;

/// Fill color for outline glyphs: opaque black.
pub const GLYPH_FILL: [u8; 3] = [0, 0, 0];

/// A rasterized glyph ready to be composited.
#[derive(Debug, Clone)]
pub struct RenderedGlyph {
    /// Glyph pixels with straight (non-premultiplied) alpha.
    pub image: RgbaImage,
    /// Point of `image` that lands on the anchor: the center of the glyph's
    /// ink bounds. Lies outside `image` when the glyph was clipped.
    pub center: (f64, f64),
}

impl RenderedGlyph {
    /// A glyph with no visible pixels.
    pub fn empty() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            center: (0.0, 0.0),
        }
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Crop to the pixels that fall on the canvas when drawn at `target`.
    pub fn clip_to(self, target: &GlyphTarget) -> Self {
        if self.is_empty() {
            return self;
        }
        let full = Window::sized(self.image.width(), self.image.height());
        match target.visible_window(full, self.center) {
            None => Self::empty(),
            Some(window) if window == full => self,
            Some(window) => Self {
                image: imageops::crop_imm(
                    &self.image,
                    window.x0 as u32,
                    window.y0 as u32,
                    window.width(),
                    window.height(),
                )
                .to_image(),
                center: window.relative(self.center),
            },
        }
    }
}

/// Where a glyph is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphTarget {
    /// Pixels per em.
    pub size: f32,
    /// Canvas point the glyph's center lands on.
    pub anchor: (f64, f64),
    /// Canvas width and height. Nothing outside is drawn.
    pub canvas: (u32, u32),
}

impl GlyphTarget {
    /// Part of `ink` that reaches the canvas, for a glyph whose center is
    /// `center`, both in glyph pixels. `None` when nothing is visible.
    fn visible_window(&self, ink: Window, center: (f64, f64)) -> Option<Window> {
        let dx = (self.anchor.0 - center.0).round() as i64;
        let dy = (self.anchor.1 - center.1).round() as i64;
        let window = Window {
            x0: ink.x0.max(dx.saturating_neg()),
            y0: ink.y0.max(dy.saturating_neg()),
            x1: ink.x1.min(i64::from(self.canvas.0).saturating_sub(dx)),
            y1: ink.y1.min(i64::from(self.canvas.1).saturating_sub(dy)),
        };
        (window.x0 < window.x1 && window.y0 < window.y1).then_some(window)
    }
}

/// Half-open pixel rectangle in glyph coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Window {
    fn sized(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: i64::from(width),
            y1: i64::from(height),
        }
    }

    fn width(&self) -> u32 {
        u32::try_from(self.x1 - self.x0).unwrap_or(u32::MAX)
    }

    fn height(&self) -> u32 {
        u32::try_from(self.y1 - self.y0).unwrap_or(u32::MAX)
    }

    /// `point` relative to this window's top-left corner.
    fn relative(&self, point: (f64, f64)) -> (f64, f64) {
        (point.0 - self.x0 as f64, point.1 - self.y0 as f64)
    }
}

/// Pluggable glyph renderer.
///
/// Implement this trait to draw masks with something other than a font file,
/// and pass it to [`crate::FaceMasker::new`].
pub trait GlyphRasterizer: Send + Sync {
    /// Render the whole of `glyph` at `size` pixels per em.
    fn rasterize(&self, glyph: char, size: f32) -> Result<RenderedGlyph, FaceMaskError>;

    /// Render only the part of `glyph` that lands on the canvas of `target`.
    ///
    /// The provided method renders the whole glyph and clips it afterwards.
    /// Override it when a full render can be far larger than the canvas.
    fn rasterize_visible(
        &self,
        glyph: char,
        target: &GlyphTarget,
    ) -> Result<RenderedGlyph, FaceMaskError> {
        Ok(self.rasterize(glyph, target.size)?.clip_to(target))
    }
}

/// Rasterizer backed by a TrueType/OpenType font or font collection.
///
/// Scalable outlines are filled with [`GLYPH_FILL`]. Glyphs without an
/// outline (most color emoji fonts) are drawn from the closest embedded
/// bitmap strike instead. Only the visible part of a glyph is rendered, so
/// a huge face box costs no more than the canvas it is drawn on.
pub struct FontRasterizer {
    data: Vec<u8>,
    index: u32,
}

impl FontRasterizer {
    /// Load a font from raw file bytes. Collections use their first font.
    pub fn new(data: Vec<u8>) -> Result<Self, FaceMaskError> {
        Self::with_index(data, 0)
    }

    /// Load font `index` of a collection (`.ttc`). Plain fonts only have index 0.
    pub fn with_index(data: Vec<u8>, index: u32) -> Result<Self, FaceMaskError> {
        FontRef::from_index(&data, index)
            .map_err(|e| FaceMaskError::FontError(e.to_string()))?;
        Ok(Self { data, index })
    }

    /// Load a font file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FaceMaskError> {
        Self::from_path_with_index(path, 0)
    }

    /// Load font `index` from a font or collection file on disk.
    pub fn from_path_with_index(
        path: impl AsRef<Path>,
        index: u32,
    ) -> Result<Self, FaceMaskError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| FaceMaskError::FontError(format!("{}: {e}", path.display())))?;
        Self::with_index(data, index)
    }

    /// Whether the font maps `glyph` to a glyph id.
    pub fn supports(&self, glyph: char) -> bool {
        self.font()
            .ok()
            .and_then(|font| glyph_id(&font, glyph))
            .is_some()
    }

    fn font(&self) -> Result<FontRef<'_>, FaceMaskError> {
        FontRef::from_index(&self.data, self.index)
            .map_err(|e| FaceMaskError::FontError(e.to_string()))
    }

    fn render(
        &self,
        glyph: char,
        size: f32,
        target: Option<&GlyphTarget>,
    ) -> Result<RenderedGlyph, FaceMaskError> {
        // Size::new(0.0) would mean "unscaled font units"
        if !(size.is_finite() && size > 0.0) {
            return Ok(RenderedGlyph::empty());
        }

        let font = self.font()?;
        let gid = glyph_id(&font, glyph).ok_or(FaceMaskError::MissingGlyph(glyph))?;

        if let Some(rendered) = render_outline(&font, gid, size, target) {
            return Ok(rendered);
        }
        if let Some(rendered) = render_bitmap(&font, gid, size, target) {
            return Ok(rendered);
        }
        Err(FaceMaskError::UnsupportedGlyph(glyph))
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(&self, glyph: char, size: f32) -> Result<RenderedGlyph, FaceMaskError> {
        self.render(glyph, size, None)
    }

    fn rasterize_visible(
        &self,
        glyph: char,
        target: &GlyphTarget,
    ) -> Result<RenderedGlyph, FaceMaskError> {
        self.render(glyph, target.size, Some(target))
    }
}

fn glyph_id(font: &FontRef<'_>, glyph: char) -> Option<GlyphId> {
    font.charmap()
        .map(glyph)
        .filter(|gid| *gid != GlyphId::NOTDEF)
}

/// Records an outline as zeno path commands, flipping font y-up into image y-down.
struct PathRecorder {
    commands: Vec<Command>,
    min: (f32, f32),
    max: (f32, f32),
}

impl PathRecorder {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            min: (f32::INFINITY, f32::INFINITY),
            max: (f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    fn point(&mut self, x: f32, y: f32) -> Vector {
        let y = -y;
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
        Vector::new(x, y)
    }

    fn has_area(&self) -> bool {
        self.min.0 < self.max.0 && self.min.1 < self.max.1
    }

    /// Smallest pixel rectangle holding the outline.
    fn ink(&self) -> Window {
        Window {
            x0: self.min.0.floor() as i64,
            y0: self.min.1.floor() as i64,
            x1: self.max.0.ceil() as i64,
            y1: self.max.1.ceil() as i64,
        }
    }

    fn center(&self) -> (f64, f64) {
        (
            (f64::from(self.min.0) + f64::from(self.max.0)) / 2.0,
            (f64::from(self.min.1) + f64::from(self.max.1)) / 2.0,
        )
    }
}

impl OutlinePen for PathRecorder {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(Command::MoveTo(p));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(Command::LineTo(p));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let c = self.point(cx0, cy0);
        let p = self.point(x, y);
        self.commands.push(Command::QuadTo(c, p));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let c0 = self.point(cx0, cy0);
        let c1 = self.point(cx1, cy1);
        let p = self.point(x, y);
        self.commands.push(Command::CurveTo(c0, c1, p));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}

/// Fill the glyph outline at `size` ppem. `None` if the font has no inked
/// outline for it, so a blank placeholder never hides a bitmap strike.
fn render_outline(
    font: &FontRef<'_>,
    gid: GlyphId,
    size: f32,
    target: Option<&GlyphTarget>,
) -> Option<RenderedGlyph> {
    let outlines = font.outline_glyphs();
    let outline = outlines.get(gid)?;

    let mut recorder = PathRecorder::new();
    let settings = DrawSettings::unhinted(Size::new(size), LocationRef::default());
    outline.draw(settings, &mut recorder).ok()?;

    if !recorder.has_area() {
        return None;
    }

    let ink = recorder.ink();
    let center = recorder.center();
    let window = match target {
        Some(target) => match target.visible_window(ink, center) {
            Some(window) => window,
            None => return Some(RenderedGlyph::empty()),
        },
        None => ink,
    };

    let (width, height) = (window.width(), window.height());
    let (coverage, _) = Mask::new(&recorder.commands[..])
        .origin(Origin::TopLeft)
        .size(width, height)
        .offset(Vector::new(-window.x0 as f32, -window.y0 as f32))
        .render();

    let [r, g, b] = GLYPH_FILL;
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = coverage[(y * width + x) as usize];
        Rgba([r, g, b, alpha])
    });

    Some(RenderedGlyph {
        image,
        center: window.relative(center),
    })
}

/// Draw the glyph from the nearest embedded bitmap strike, scaled to `size` ppem.
fn render_bitmap(
    font: &FontRef<'_>,
    gid: GlyphId,
    size: f32,
    target: Option<&GlyphTarget>,
) -> Option<RenderedGlyph> {
    let strikes = BitmapStrikes::new(font);
    let bitmap = strikes.glyph_for_size(Size::new(size), gid)?;
    let strike = decode_strike(&bitmap.data, bitmap.width, bitmap.height)?;
    Some(scale_strike(
        &strike,
        (bitmap.ppem_x, bitmap.ppem_y),
        size,
        target,
    ))
}

/// Strike pixels as straight RGBA.
fn decode_strike(data: &BitmapData<'_>, width: u32, height: u32) -> Option<RgbaImage> {
    match data {
        BitmapData::Png(bytes) => Some(image::load_from_memory(bytes).ok()?.to_rgba8()),
        BitmapData::Bgra(bytes) => {
            let pixels: Vec<u8> = bytes
                .chunks_exact(4)
                .flat_map(|bgra| [bgra[2], bgra[1], bgra[0], bgra[3]])
                .collect();
            RgbaImage::from_raw(width, height, pixels)
        }
        // Packed monochrome/grayscale strikes are not used by emoji fonts
        _ => None,
    }
}

/// Scale a strike drawn at `ppem` to `size`, keeping only what `target` shows.
fn scale_strike(
    strike: &RgbaImage,
    ppem: (f32, f32),
    size: f32,
    target: Option<&GlyphTarget>,
) -> RenderedGlyph {
    let scale_x = f64::from(size) / f64::from(ppem.0.max(1.0));
    let scale_y = f64::from(size) / f64::from(ppem.1.max(1.0));
    let full_w = (f64::from(strike.width()) * scale_x).round().max(1.0);
    let full_h = (f64::from(strike.height()) * scale_y).round().max(1.0);

    let full = Window {
        x0: 0,
        y0: 0,
        x1: full_w as i64,
        y1: full_h as i64,
    };
    let center = (full_w / 2.0, full_h / 2.0);
    let window = match target {
        Some(target) => match target.visible_window(full, center) {
            Some(window) => window,
            None => return RenderedGlyph::empty(),
        },
        None => full,
    };

    let image = if window == full {
        imageops::resize(strike, window.width(), window.height(), FilterType::Lanczos3)
    } else {
        // Sample just the visible window; a full resize could dwarf the canvas
        RgbaImage::from_fn(window.width(), window.height(), |x, y| {
            let u = (window.x0 as f64 + f64::from(x) + 0.5) / full_w;
            let v = (window.y0 as f64 + f64::from(y) + 0.5) / full_h;
            imageops::sample_bilinear(strike, u as f32, v as f32)
                .unwrap_or(Rgba([0, 0, 0, 0]))
        })
    };

    RenderedGlyph {
        image,
        center: window.relative(center),
    }
}
