//! Print the faces rustface finds in an image, with their boxes and glyphs.
//!
//! Usage:
//!   cargo run --example debug_face_detection -- <model.bin> <image>...

use std::path::Path;

use facemask::{FaceDetector, Palette, RustfaceDetector};

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(model) = args.next() else {
        eprintln!("usage: debug_face_detection <seeta_fd_frontal_v1.0.bin> <image>...");
        std::process::exit(2);
    };

    let detector = RustfaceDetector::from_model_path(&model).expect("failed to load model");
    let palette = Palette::default();

    for path in args {
        let faces = match detector.detect(Path::new(&path)) {
            Ok(faces) => faces,
            Err(e) => {
                println!("=== {path}: {e}");
                continue;
            }
        };

        println!("=== {path} ===");
        if faces.is_empty() {
            println!("  NO FACES DETECTED, output would be an unmasked copy");
        }
        for (i, face) in faces.iter().enumerate() {
            let Some(bbox) = face.bounding_box() else {
                continue;
            };
            let (cx, cy) = bbox.center();
            println!(
                "    face {i}: box=({}, {}, {}x{}), center=({cx}, {cy}), glyph={}",
                bbox.x,
                bbox.y,
                bbox.width,
                bbox.height,
                palette.select(i),
            );
        }
        println!("  → {}", facemask::masked_output_path(Path::new(&path)).display());
        println!();
    }
}
