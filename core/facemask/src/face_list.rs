use std::path::{Path, PathBuf};

use log::info;

use crate::error::FaceMaskError;
use crate::face_detector::FaceDetector;
use crate::geometry::Face;

/// Detector that replays faces saved in a JSON file.
///
/// The file holds one array of vertices per face, in the same shape detectors
/// report them: `[[{"x": 10, "y": 10}, {"x": 50, "y": 10}, ...], ...]`.
/// The image itself is never read.
pub struct FaceListFile {
    path: PathBuf,
}

impl FaceListFile {
    /// Replay the faces stored in the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a face list from JSON text.
    pub fn parse(json: &str) -> Result<Vec<Face>, FaceMaskError> {
        serde_json::from_str(json)
            .map_err(|e| FaceMaskError::DetectionError(format!("invalid face list: {e}")))
    }
}

impl FaceDetector for FaceListFile {
    fn detect(&self, image_path: &Path) -> Result<Vec<Face>, FaceMaskError> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            FaceMaskError::DetectionError(format!("{}: {e}", self.path.display()))
        })?;
        let faces = Self::parse(&json)?;
        info!(
            "loaded {} face(s) for {} from {}",
            faces.len(),
            image_path.display(),
            self.path.display()
        );
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_faces() {
        let faces = FaceListFile::parse(r#"[[{"x": 1, "y": 2}, {"x": 3, "y": 4}], [{"y": 7}]]"#)
            .unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[1].vertices().len(), 1);
    }

    #[test]
    fn empty_list_is_no_faces() {
        assert!(FaceListFile::parse("[]").unwrap().is_empty());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(matches!(
            FaceListFile::parse(r#"{"faces": []}"#),
            Err(FaceMaskError::DetectionError(_))
        ));
    }

    #[test]
    fn missing_file_is_detection_error() {
        let detector = FaceListFile::new("/nonexistent/facemask/faces.json");
        let result = detector.detect(Path::new("photo.png"));
        assert!(matches!(result, Err(FaceMaskError::DetectionError(_))));
    }
}
