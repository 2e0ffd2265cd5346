//! Face masking: cover every detected face in a photo with an emoji glyph.
//!
//! # Example
//!
//! ```no_run
//! use facemask::{FaceListFile, FaceMasker, FontRasterizer};
//!
//! let detector = FaceListFile::new("faces.json");
//! let font = FontRasterizer::from_path("NotoEmoji-Regular.ttf").unwrap();
//! let result = FaceMasker::new(Box::new(detector), Box::new(font))
//!     .quality(0.9)
//!     .mask_file("photo.png")
//!     .unwrap();
//! println!("Masked {} face(s) into {}", result.faces_masked, result.path.display());
//! ```
#![warn(missing_docs)]

mod composite;
mod error;
/// Face detection traits.
pub mod face_detector;
mod face_list;
mod geometry;
/// Glyph rasterization traits and the font-backed rasterizer.
pub mod glyph;
mod output;
mod palette;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
#[cfg(feature = "cloud-vision")]
/// Google Cloud Vision face detector backend.
pub mod vision_backend;

use std::path::{Path, PathBuf};

use log::info;

/// Canvas composition of the base image and face glyphs.
pub use composite::compose_overlay;
/// Error type returned by facemask operations.
pub use error::FaceMaskError;
/// Face detection trait.
pub use face_detector::FaceDetector;
/// Detector that reads faces from a JSON file.
pub use face_list::FaceListFile;
/// Face polygons and their bounding boxes.
pub use geometry::{extract_bounding_box, BoundingBox, Face, Vertex};
/// Glyph rendering trait and the font-backed implementation.
pub use glyph::{FontRasterizer, GlyphRasterizer, GlyphTarget, RenderedGlyph};
/// Output naming, encoding, and writing.
pub use output::{encode_jpeg, masked_output_path, persist, DEFAULT_QUALITY};
/// Glyph rotation assigned to faces.
pub use palette::Palette;
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model file.
pub use rustface_backend::RustfaceDetector;
#[cfg(feature = "cloud-vision")]
/// Detector that calls the Google Cloud Vision API.
pub use vision_backend::CloudVisionDetector;

/// What to do when the detector reports no usable faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyDetection {
    /// Write an unmasked re-encoded copy of the input.
    #[default]
    PassThrough,

    /// Stop with [`FaceMaskError::NoFacesDetected`] and write nothing.
    Fail,
}

/// Result of a single masking run.
#[derive(Debug, Clone)]
pub struct MaskedPhoto {
    /// Where the masked image was written.
    pub path: PathBuf,

    /// Width of the output image in pixels (same as the input).
    pub width: u32,

    /// Height of the output image in pixels (same as the input).
    pub height: u32,

    /// Number of faces with at least one vertex that were masked.
    pub faces_masked: usize,
}

/// Masks faces in image files.
///
/// Owns the face detector and glyph rasterizer for its whole lifetime; every
/// call to [`FaceMasker::mask_file`] decodes and composites on a fresh canvas.
pub struct FaceMasker {
    detector: Box<dyn FaceDetector>,
    rasterizer: Box<dyn GlyphRasterizer>,
    palette: Palette,
    quality: f32,
    on_empty: EmptyDetection,
}

impl FaceMasker {
    /// Create a masker from its detector and glyph rasterizer.
    pub fn new(detector: Box<dyn FaceDetector>, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        Self {
            detector,
            rasterizer,
            palette: Palette::default(),
            quality: DEFAULT_QUALITY,
            on_empty: EmptyDetection::default(),
        }
    }

    /// Set the glyph rotation (default: `😊 😎 😍 🤔 😄`).
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set the JPEG quality from 0.0 (lowest) to 1.0 (highest).
    /// Default: 0.92.
    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the policy for images without faces (default: `EmptyDetection::PassThrough`).
    pub fn on_empty(mut self, policy: EmptyDetection) -> Self {
        self.on_empty = policy;
        self
    }

    /// Detect faces in `image_path`, mask them, and write `<base>-masked.jpg`
    /// beside the input.
    pub fn mask_file(&self, image_path: impl AsRef<Path>) -> Result<MaskedPhoto, FaceMaskError> {
        let image_path = image_path.as_ref();
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(FaceMaskError::InvalidQuality(self.quality));
        }

        let faces = self.detector.detect(image_path)?;
        let usable = faces.iter().filter(|face| !face.is_empty()).count();
        info!(
            "{}: {} face(s) detected, {usable} usable",
            image_path.display(),
            faces.len()
        );

        if usable == 0 {
            match self.on_empty {
                EmptyDetection::Fail => return Err(FaceMaskError::NoFacesDetected),
                EmptyDetection::PassThrough => {
                    info!("no faces to mask, writing an unmasked copy")
                }
            }
        }

        let base = composite::decode_image(image_path)?;
        let raster =
            composite::compose_overlay(&base, &faces, &self.palette, self.rasterizer.as_ref())?;
        let path = output::persist(&raster, image_path, self.quality)?;

        Ok(MaskedPhoto {
            path,
            width: raster.width(),
            height: raster.height(),
            faces_masked: usable,
        })
    }
}
