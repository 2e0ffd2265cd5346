use std::path::Path;

use log::info;

use crate::composite::decode_image;
use crate::error::FaceMaskError;
use crate::face_detector::FaceDetector;
use crate::geometry::{Face, Vertex};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The SeetaFace frontal model (`seeta_fd_frontal_v1.0.bin`) is read from disk
/// once on construction and cloned into a fresh detector for every image.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load the SeetaFace model stored at `model_path`.
    pub fn from_model_path(model_path: impl AsRef<Path>) -> Result<Self, FaceMaskError> {
        let model_path = model_path.as_ref();
        let file = std::fs::File::open(model_path).map_err(|e| {
            FaceMaskError::DetectionError(format!("{}: {e}", model_path.display()))
        })?;
        let model = rustface::read_model(std::io::BufReader::new(file)).map_err(|e| {
            FaceMaskError::DetectionError(format!(
                "invalid SeetaFace model {}: {e}",
                model_path.display()
            ))
        })?;
        Ok(Self { model })
    }

    /// Detect faces in an already decoded grayscale buffer.
    pub fn detect_gray(&self, gray: &[u8], width: u32, height: u32) -> Vec<Face> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                let (left, top) = (bbox.x() as f64, bbox.y() as f64);
                let right = left + bbox.width() as f64;
                let bottom = top + bbox.height() as f64;
                Face::new(vec![
                    Vertex::new(left, top),
                    Vertex::new(right, top),
                    Vertex::new(right, bottom),
                    Vertex::new(left, bottom),
                ])
            })
            .collect()
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Face>, FaceMaskError> {
        let image = decode_image(image_path)?;
        let gray = image::imageops::grayscale(&image);
        let faces = self.detect_gray(gray.as_raw(), gray.width(), gray.height());
        info!("rustface found {} face(s) in {}", faces.len(), image_path.display());
        Ok(faces)
    }
}
