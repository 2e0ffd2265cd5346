use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, RgbImage};
use log::info;

use crate::error::FaceMaskError;

/// Marker appended to the input's base name.
const OUTPUT_SUFFIX: &str = "-masked";

/// Extension of the single output format (JPEG).
const OUTPUT_EXTENSION: &str = "jpg";

/// Default JPEG quality, the usual canvas encoder default.
pub const DEFAULT_QUALITY: f32 = 0.92;

/// Where the masked copy of `source` is written.
///
/// The parent directory is kept. The file name is cut at its first `.`
/// (a leading dot belongs to the name), then `-masked.jpg` is appended:
///
/// - `photo.png` → `photo-masked.jpg`
/// - `shots/a.tar.gz` → `shots/a-masked.jpg`
/// - `dir.v2/photo` → `dir.v2/photo-masked.jpg`
/// - `.hidden` → `.hidden-masked.jpg`
pub fn masked_output_path(source: &Path) -> PathBuf {
    let name = source.file_name().unwrap_or_default();

    let mut file_name = base_name(name).to_os_string();
    file_name.push(OUTPUT_SUFFIX);
    file_name.push(".");
    file_name.push(OUTPUT_EXTENSION);

    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// `name` up to its first non-leading `.`, without touching non-UTF-8 bytes.
fn base_name(name: &OsStr) -> &OsStr {
    let mut base = name;
    // Each file_stem call drops one extension
    while let Some(stem) = Path::new(base).file_stem().filter(|stem| *stem != base) {
        base = stem;
    }
    base
}

/// Encode the raster as JPEG at `quality` (0.0–1.0).
pub fn encode_jpeg(raster: &RgbImage, quality: f32) -> Result<Vec<u8>, FaceMaskError> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(FaceMaskError::InvalidQuality(quality));
    }

    let quality_percent = ((quality * 100.0).round() as u8).max(1);
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality_percent);
    encoder
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| FaceMaskError::EncodeError(e.to_string()))?;

    Ok(buffer)
}

/// Encode `raster` and write it beside `source`, replacing any previous output.
///
/// The file only appears at its final path once it has been fully written.
pub fn persist(raster: &RgbImage, source: &Path, quality: f32) -> Result<PathBuf, FaceMaskError> {
    let destination = masked_output_path(source);
    let data = encode_jpeg(raster, quality)?;
    write_replacing(&destination, &data)?;

    info!(
        "wrote {} ({}x{}, {} bytes)",
        destination.display(),
        raster.width(),
        raster.height(),
        data.len()
    );
    Ok(destination)
}

/// Write through a sibling temporary file and rename it into place.
fn write_replacing(destination: &Path, data: &[u8]) -> Result<(), FaceMaskError> {
    let write_error = |source: std::io::Error| FaceMaskError::WriteError {
        path: destination.to_path_buf(),
        source,
    };

    let mut temp_name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".partial");
    let temp = destination.with_file_name(temp_name);

    fs::write(&temp, data).map_err(|e| {
        let _ = fs::remove_file(&temp);
        write_error(e)
    })?;
    fs::rename(&temp, destination).map_err(|e| {
        let _ = fs::remove_file(&temp);
        write_error(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("facemask-output-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn simple_name() {
        assert_eq!(
            masked_output_path(Path::new("photo.png")),
            PathBuf::from("photo-masked.jpg")
        );
    }

    #[test]
    fn cuts_at_first_dot() {
        assert_eq!(
            masked_output_path(Path::new("shots/a.tar.gz")),
            PathBuf::from("shots/a-masked.jpg")
        );
    }

    #[test]
    fn no_extension_keeps_whole_name() {
        assert_eq!(
            masked_output_path(Path::new("photo")),
            PathBuf::from("photo-masked.jpg")
        );
    }

    #[test]
    fn dots_in_directories_are_ignored() {
        assert_eq!(
            masked_output_path(Path::new("./dir.v2/photo")),
            PathBuf::from("./dir.v2/photo-masked.jpg")
        );
        assert_eq!(
            masked_output_path(Path::new("../album/img.jpeg")),
            PathBuf::from("../album/img-masked.jpg")
        );
    }

    #[test]
    fn leading_dot_belongs_to_name() {
        assert_eq!(
            masked_output_path(Path::new(".hidden")),
            PathBuf::from(".hidden-masked.jpg")
        );
        assert_eq!(
            masked_output_path(Path::new(".hidden.png")),
            PathBuf::from(".hidden-masked.jpg")
        );
    }

    #[test]
    fn repeated_and_trailing_dots() {
        assert_eq!(
            masked_output_path(Path::new("a..b")),
            PathBuf::from("a-masked.jpg")
        );
        assert_eq!(
            masked_output_path(Path::new("photo.")),
            PathBuf::from("photo-masked.jpg")
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_name_is_kept_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"shots/caf\xe9.v1.png"));
        let output = masked_output_path(source);
        assert_eq!(
            output.as_os_str().as_bytes(),
            b"shots/caf\xe9-masked.jpg".as_slice()
        );
    }

    #[test]
    fn encode_jpeg_produces_valid_output() {
        let data = encode_jpeg(&make_test_rgb(48, 64), 0.8).unwrap();
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xD8);
    }

    #[test]
    fn encode_rejects_bad_quality() {
        let img = make_test_rgb(4, 4);
        assert!(matches!(
            encode_jpeg(&img, 1.5),
            Err(FaceMaskError::InvalidQuality(_))
        ));
        assert!(matches!(
            encode_jpeg(&img, -0.1),
            Err(FaceMaskError::InvalidQuality(_))
        ));
    }

    #[test]
    fn zero_quality_still_encodes() {
        assert!(!encode_jpeg(&make_test_rgb(8, 8), 0.0).unwrap().is_empty());
    }

    #[test]
    fn persist_writes_beside_source() {
        let dir = scratch_dir("persist");
        let source = dir.join("group.png");
        let raster = make_test_rgb(40, 30);

        let written = persist(&raster, &source, DEFAULT_QUALITY).unwrap();
        assert_eq!(written, dir.join("group-masked.jpg"));

        let decoded = image::open(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
        assert!(!dir.join("group-masked.jpg.partial").exists());
    }

    #[test]
    fn persist_overwrites_existing_output() {
        let dir = scratch_dir("overwrite");
        let source = dir.join("group.png");
        fs::write(dir.join("group-masked.jpg"), b"stale").unwrap();

        let written = persist(&make_test_rgb(16, 16), &source, DEFAULT_QUALITY).unwrap();
        let data = fs::read(written).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn persist_into_missing_directory_fails_cleanly() {
        let dir = scratch_dir("missing");
        let source = dir.join("nope").join("photo.png");
        let result = persist(&make_test_rgb(8, 8), &source, DEFAULT_QUALITY);
        assert!(matches!(result, Err(FaceMaskError::WriteError { .. })));
        assert!(!dir.join("nope").exists());
    }
}
