//! Common helpers shared across the try-on crates.

/// Persistent settings for the CLI and GUI.
pub mod config;
/// Test fixture path resolution.
pub mod fixtures;
/// Image loading, cropping and tensor conversion.
pub mod image_utils;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;
/// Webcam capture.
pub mod webcam;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::LevelFilter;

pub use config::{
    AppSettings, CameraSettings, DEFAULT_MODEL_PATH, DetectorSettings, LayoutSettings,
    OverlaySettings, TelemetrySettings, default_settings_path,
};
pub use fixtures::{fixture_path, fixtures_dir, load_fixture_json};
pub use image_utils::{
    SquareRegion, crop_region_resized, load_image, rgb_to_chw_unit, rgb_to_hwc_unit,
};
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    telemetry_level, timing_guard, timing_guard_if,
};
pub use webcam::{WebcamCapture, list_webcam_devices};

/// Initialize logging once for CLI and GUI environments.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Telemetry output is always let
/// through so that [`configure_telemetry`] alone decides what gets timed.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TELEMETRY_TARGET, LevelFilter::Trace);

    // A logger may already be installed (tests, embedding); keep it.
    let _ = builder.try_init();
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
