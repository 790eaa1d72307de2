//! Configuration loading and CLI override logic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use tryon_utils::{AppSettings, default_settings_path, normalize_path};

use crate::args::TryOnArgs;

/// Load application settings from a file, the default settings path, or built-in defaults.
pub fn load_settings(config_path: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config_path {
        let resolved = normalize_path(path)?;
        let settings = AppSettings::load_from_path(&resolved)?;
        info!("Loaded settings from {}", resolved.display());
        return Ok(settings);
    }

    let default_path = default_settings_path();
    if !default_path.exists() {
        return Ok(AppSettings::default());
    }
    let settings = AppSettings::load_from_path(&default_path).with_context(|| {
        format!(
            "failed to load default settings from {}",
            default_path.display()
        )
    })?;
    info!("Loaded settings from {}", default_path.display());
    Ok(settings)
}

/// Resolve the model path to an existing absolute path.
pub fn resolve_model(path: &Path) -> Result<PathBuf> {
    normalize_path(path)
        .with_context(|| format!("face-mesh model not found at {}", path.display()))
}

/// Apply command-line arguments on top of loaded or default settings.
pub fn apply_cli_overrides(settings: &mut AppSettings, args: &TryOnArgs) {
    if args.telemetry {
        settings.telemetry.enabled = true;
    }
    if let Some(level) = args.telemetry_level.as_ref() {
        let normalized = level.trim().to_ascii_lowercase();
        if !normalized.is_empty() {
            if normalized == "off" {
                settings.telemetry.enabled = false;
            }
            settings.telemetry.level = normalized;
        }
    }

    if let Some(model) = args.model.as_ref() {
        settings.model_path = Some(model.display().to_string());
    }
    if let Some(earring) = args.earring.as_ref() {
        settings.overlays.earring_image = earring.clone();
    }
    if let Some(necklace) = args.necklace.as_ref() {
        settings.overlays.necklace_image = necklace.clone();
    }
    if args.no_mirror {
        settings.layout.mirror = false;
    }

    let detector = &mut settings.detector;
    if args.no_refine {
        detector.refine_landmarks = false;
    }
    if let Some(max_faces) = args.max_faces {
        detector.max_num_faces = max_faces;
    }
    if let Some(score) = args.detection_confidence {
        detector.min_detection_confidence = score;
    }
    if let Some(score) = args.tracking_confidence {
        detector.min_tracking_confidence = score;
    }

    if let Some(device) = args.device {
        settings.camera.device_index = device;
    }

    settings.sanitize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn overrides_replace_loaded_values() {
        let args = TryOnArgs::parse_from([
            "tryon-cli",
            "--input",
            "faces",
            "--earring",
            "hoops.png",
            "--no-mirror",
            "--no-refine",
            "--detection-confidence",
            "1.5",
            "--model",
            "custom.onnx",
        ]);
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &args);

        assert_eq!(settings.overlays.earring_image, "hoops.png");
        assert_eq!(settings.overlays.necklace_image, "jewelry/necklace1.png");
        assert!(!settings.layout.mirror);
        assert!(!settings.detector.refine_landmarks);
        assert_eq!(settings.detector.min_detection_confidence, 1.0);
        assert_eq!(settings.model_path.as_deref(), Some("custom.onnx"));
    }

    #[test]
    fn telemetry_off_disables_timing() {
        let args = TryOnArgs::parse_from([
            "tryon-cli",
            "--input",
            "faces",
            "--telemetry",
            "--telemetry-level",
            "OFF",
        ]);
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &args);
        assert!(!settings.telemetry.enabled);
        assert_eq!(settings.telemetry.level, "off");
    }

    #[test]
    fn webcam_flags_require_webcam_mode() {
        assert!(TryOnArgs::try_parse_from(["tryon-cli", "--input", "a.png", "--frames", "3"]).is_err());
        assert!(TryOnArgs::try_parse_from(["tryon-cli", "--input", "a.png", "--webcam"]).is_err());
        let args = TryOnArgs::try_parse_from(["tryon-cli", "--webcam", "--frames", "3", "--device", "1"])
            .expect("webcam args");
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &args);
        assert_eq!(settings.camera.device_index, 1);
        assert_eq!(args.frames, 3);
    }
}
