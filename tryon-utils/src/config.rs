//! Settings shared by the try-on CLI and GUI.
//!
//! Every section deserializes with `#[serde(default)]`, so partial JSON files on disk only need to
//! mention the values they override.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Default location of the face-mesh landmark model.
pub const DEFAULT_MODEL_PATH: &str = "models/face_landmark.onnx";

/// Overlay graphics drawn on top of the camera frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OverlaySettings {
    /// Image drawn at both ear landmarks.
    pub earring_image: String,
    /// Image drawn below the chin landmark.
    pub necklace_image: String,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            earring_image: "jewelry/earring.png".to_string(),
            necklace_image: "jewelry/necklace1.png".to_string(),
        }
    }
}

/// Options handed to the landmark detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    /// Maximum number of faces to report per frame.
    pub max_num_faces: usize,
    /// Keep the refined iris landmarks when the model provides them.
    pub refine_landmarks: bool,
    /// Minimum face-presence score required to start tracking a face.
    pub min_detection_confidence: f32,
    /// Minimum face-presence score required to keep tracking a face.
    pub min_tracking_confidence: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// Canvas geometry and overlay placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Flip the frame and landmark x-coordinates to produce a selfie view.
    pub mirror: bool,
    pub earring_width: u32,
    pub earring_height: u32,
    /// Vertical offset (pixels) from the ear landmark to the earring centre.
    pub ear_offset_y: f32,
    pub necklace_width: u32,
    pub necklace_height: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            canvas_width: 640,
            canvas_height: 480,
            mirror: true,
            earring_width: 40,
            earring_height: 40,
            ear_offset_y: 30.0,
            necklace_width: 140,
            necklace_height: 70,
        }
    }
}

/// Webcam capture request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CameraSettings {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string, falling back to `Debug` for unknown values.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "warning" => LevelFilter::Warn,
            other => other.parse().unwrap_or(LevelFilter::Debug),
        }
    }

    pub fn set_level(&mut self, level: LevelFilter) {
        self.level = level.as_str().to_ascii_lowercase();
    }
}

/// Persistent application settings consumed by CLI and GUI front ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Path to the face-mesh ONNX model. `None` falls back to [`DEFAULT_MODEL_PATH`].
    pub model_path: Option<String>,
    pub overlays: OverlaySettings,
    pub detector: DetectorSettings,
    pub layout: LayoutSettings,
    pub camera: CameraSettings,
    pub telemetry: TelemetrySettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            model_path: Some(DEFAULT_MODEL_PATH.to_string()),
            overlays: OverlaySettings::default(),
            detector: DetectorSettings::default(),
            layout: LayoutSettings::default(),
            camera: CameraSettings::default(),
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let mut settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        if settings.model_path.is_none() {
            settings.model_path = Some(DEFAULT_MODEL_PATH.to_string());
        }
        settings.sanitize();
        Ok(settings)
    }

    /// Serialize settings to disk as pretty-printed JSON, creating parent directories.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// The model path to load, with the default applied.
    pub fn resolved_model_path(&self) -> PathBuf {
        PathBuf::from(
            self.model_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(DEFAULT_MODEL_PATH),
        )
    }

    /// Clamp values into ranges the pipeline can work with.
    pub fn sanitize(&mut self) {
        let layout = &mut self.layout;
        layout.canvas_width = layout.canvas_width.max(1);
        layout.canvas_height = layout.canvas_height.max(1);
        let detector = &mut self.detector;
        detector.min_detection_confidence = detector.min_detection_confidence.clamp(0.0, 1.0);
        detector.min_tracking_confidence = detector.min_tracking_confidence.clamp(0.0, 1.0);
        let camera = &mut self.camera;
        camera.fps = camera.fps.max(1);
    }
}

/// Returns the default path for persisted settings (`config/tryon_settings.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/tryon_settings.json"))
        .unwrap_or_else(|_| PathBuf::from("config/tryon_settings.json"))
}
