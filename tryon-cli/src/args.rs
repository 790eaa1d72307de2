//! Command-line argument definitions for tryon-cli.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Hang earrings and a necklace on faces in images or a live webcam stream.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct TryOnArgs {
    /// Path to an image file or a directory containing images.
    #[arg(short, long, required_unless_present = "webcam")]
    pub input: Option<PathBuf>,

    /// Capture from the webcam instead of reading images.
    #[arg(long, conflicts_with = "input")]
    pub webcam: bool,

    /// Number of webcam frames to composite (0 = until Ctrl+C).
    #[arg(long, default_value_t = 0, requires = "webcam")]
    pub frames: u64,

    /// Webcam device index (defaults to settings).
    #[arg(long, requires = "webcam")]
    pub device: Option<u32>,

    /// Directory composited images are written to.
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Path to the face-mesh ONNX model (defaults to settings).
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Optional settings JSON. Defaults to `config/tryon_settings.json` when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Earring image (defaults to settings).
    #[arg(long)]
    pub earring: Option<String>,

    /// Necklace image (defaults to settings).
    #[arg(long)]
    pub necklace: Option<String>,

    /// Keep the camera orientation instead of the mirrored selfie view.
    #[arg(long = "no-mirror", action = ArgAction::SetTrue)]
    pub no_mirror: bool,

    /// Drop the iris landmarks.
    #[arg(long = "no-refine", action = ArgAction::SetTrue)]
    pub no_refine: bool,

    /// Override the maximum number of faces.
    #[arg(long)]
    pub max_faces: Option<usize>,

    /// Override the face-presence score needed to start tracking.
    #[arg(long)]
    pub detection_confidence: Option<f32>,

    /// Override the face-presence score needed to keep tracking.
    #[arg(long)]
    pub tracking_confidence: Option<f32>,

    /// Write per-image anchor records to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Mark the ear and chin anchors on the composited output.
    #[arg(long, action = ArgAction::SetTrue)]
    pub annotate: bool,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,
}
