use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use facemask::{
    EmptyDetection, FaceDetector, FaceListFile, FaceMasker, FontRasterizer, DEFAULT_QUALITY,
};
use log::info;

/// Emoji font locations tried when no font is given, in order.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
    "/usr/share/fonts/truetype/noto/NotoEmoji-Regular.ttf",
    "/System/Library/Fonts/Apple Color Emoji.ttc",
    "C:\\Windows\\Fonts\\seguiemj.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DetectorKind {
    /// Local SeetaFace model (needs --model)
    Rustface,
    /// Google Cloud Vision API (needs --api-key)
    CloudVision,
    /// Faces read from a JSON file (needs --faces)
    FaceList,
}

/// Cover every face in a photo with an emoji and save it as <name>-masked.jpg.
#[derive(Debug, Parser)]
#[command(name = "facemask", version)]
struct Cli {
    /// Image to mask
    image: PathBuf,

    /// Face detector to use
    #[arg(long, value_enum, default_value_t = DetectorKind::Rustface)]
    detector: DetectorKind,

    /// SeetaFace model file (seeta_fd_frontal_v1.0.bin)
    #[arg(long, env = "FACEMASK_MODEL")]
    model: Option<PathBuf>,

    /// JSON face list for the face-list detector
    #[arg(long)]
    faces: Option<PathBuf>,

    /// Google Cloud Vision API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Font to draw emoji with; defaults to the first system emoji font found
    #[arg(long, env = "FACEMASK_FONT")]
    font: Option<PathBuf>,

    /// Font to use inside a collection (.ttc)
    #[arg(long, env = "FACEMASK_FONT_INDEX", default_value_t = 0)]
    font_index: u32,

    /// JPEG quality, 0.0 to 1.0
    #[arg(long, default_value_t = DEFAULT_QUALITY)]
    quality: f32,

    /// Fail instead of writing an unmasked copy when no face is found
    #[arg(long)]
    require_faces: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let detector = build_detector(cli)?;

    let font_path = match &cli.font {
        Some(path) => path.clone(),
        None => find_emoji_font().context("no emoji font found, pass --font")?,
    };
    info!(
        "drawing glyphs with {} (font {})",
        font_path.display(),
        cli.font_index
    );
    let font = FontRasterizer::from_path_with_index(&font_path, cli.font_index)?;

    let on_empty = if cli.require_faces {
        EmptyDetection::Fail
    } else {
        EmptyDetection::PassThrough
    };

    let result = FaceMasker::new(detector, Box::new(font))
        .quality(cli.quality)
        .on_empty(on_empty)
        .mask_file(&cli.image)
        .with_context(|| format!("failed to mask {}", cli.image.display()))?;

    println!(
        "Masked {} face(s): {} ({}x{})",
        result.faces_masked,
        result.path.display(),
        result.width,
        result.height
    );
    Ok(())
}

fn build_detector(cli: &Cli) -> anyhow::Result<Box<dyn FaceDetector>> {
    match cli.detector {
        DetectorKind::FaceList => {
            let Some(faces) = &cli.faces else {
                bail!("--faces is required with --detector face-list");
            };
            Ok(Box::new(FaceListFile::new(faces)))
        }
        #[cfg(feature = "rustface")]
        DetectorKind::Rustface => {
            let Some(model) = &cli.model else {
                bail!("--model (or FACEMASK_MODEL) is required with --detector rustface");
            };
            let detector = facemask::RustfaceDetector::from_model_path(model)?;
            Ok(Box::new(detector))
        }
        #[cfg(feature = "cloud-vision")]
        DetectorKind::CloudVision => {
            let Some(api_key) = &cli.api_key else {
                bail!("--api-key (or GOOGLE_API_KEY) is required with --detector cloud-vision");
            };
            Ok(Box::new(facemask::CloudVisionDetector::new(api_key.clone())))
        }
        #[allow(unreachable_patterns)]
        other => bail!("{other:?} detector support was not compiled in"),
    }
}

fn find_emoji_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(|candidate| Path::new(candidate))
        .find(|path| path.is_file())
        .map(Path::to_path_buf)
}
