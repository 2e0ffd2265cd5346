use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceMaskError {
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("quality must be between 0.0 and 1.0, got {0}")]
    InvalidQuality(f32),

    #[error("glyph palette must contain at least one glyph")]
    EmptyPalette,

    #[error("failed to load font: {0}")]
    FontError(String),

    #[error("font has no glyph for {0:?}")]
    MissingGlyph(char),

    #[error("font has neither an outline nor a bitmap for {0:?}")]
    UnsupportedGlyph(char),

    #[error("face detection failed: {0}")]
    DetectionError(String),

    #[error("no faces detected")]
    NoFacesDetected,

    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
