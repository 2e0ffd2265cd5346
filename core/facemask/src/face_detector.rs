use std::path::Path;

use crate::error::FaceMaskError;
use crate::geometry::Face;

/// Pluggable face detection backend.
///
/// Implement this trait to feed faces from any detector (a local model, a
/// cloud API, a precomputed list) and pass it to [`crate::FaceMasker::new`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in the image stored at `image_path`.
    ///
    /// Faces are returned in the detector's own order, which decides glyph
    /// assignment and draw order. An empty list means "no faces", not failure.
    fn detect(&self, image_path: &Path) -> Result<Vec<Face>, FaceMaskError>;
}
