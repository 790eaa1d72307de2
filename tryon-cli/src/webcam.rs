//! Headless webcam try-on: composited frames are written to the output directory.

use std::{
    fs,
    path::Path,
    sync::{Arc, mpsc},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tryon_core::{
    FaceMeshModel, ResourceLoader, SessionConfig, SessionEvent, SessionFactories, TryOn,
};
use tryon_utils::{AppSettings, list_webcam_devices};

use crate::{annotate::mark_anchors, args::TryOnArgs};

/// Run a session against the webcam until `--frames` frames were written or the camera fails.
pub fn run_webcam_mode(
    args: &TryOnArgs,
    settings: &AppSettings,
    model_path: &Path,
    loader: Arc<ResourceLoader<FaceMeshModel>>,
) -> Result<()> {
    match list_webcam_devices() {
        Ok(devices) => {
            info!("Available webcam devices:");
            for (idx, name) in devices {
                info!("  [{idx}] {name}");
            }
        }
        Err(e) => warn!("Could not enumerate webcam devices: {e:#}"),
    }

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory {}", args.output_dir.display())
    })?;

    let factories = SessionFactories::native(model_path.to_path_buf(), loader);
    let mut tryon = TryOn::new(settings.clone(), factories);
    tryon.set_frame_limit((args.frames > 0).then_some(args.frames));
    let layout = SessionConfig::from_settings(settings).layout;

    let (tx, rx) = mpsc::channel();
    tryon.start(tx)?;
    if args.frames == 0 {
        info!("Starting webcam try-on (continuous mode - press Ctrl+C to stop)");
    } else {
        info!("Starting webcam try-on ({} frames)", args.frames);
    }

    let mut written = 0u64;
    let mut failure = None;
    for event in rx {
        match event {
            SessionEvent::Started => info!("Camera and detector ready"),
            SessionEvent::Frame(report) => {
                let mut canvas = report.canvas;
                if args.annotate
                    && let Some(anchors) = report.anchors
                {
                    mark_anchors(&mut canvas, &layout, anchors);
                }
                let path = args
                    .output_dir
                    .join(format!("frame_{:05}.png", report.index));
                canvas
                    .save(&path)
                    .with_context(|| format!("failed to save {}", path.display()))?;
                debug!("Frame {}: {} face(s)", report.index, report.faces);
                written += 1;
            }
            SessionEvent::Error(message) => failure = Some(message),
            SessionEvent::Stopped => break,
        }
    }
    tryon.stop();

    info!(
        "Wrote {written} frame(s) to {}",
        args.output_dir.display()
    );
    match failure {
        Some(message) => anyhow::bail!("webcam session failed: {message}"),
        None => Ok(()),
    }
}
