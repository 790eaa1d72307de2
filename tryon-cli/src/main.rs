mod annotate;
mod args;
mod config;
mod stills;
mod webcam;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use tryon_core::face_mesh_loader;
use tryon_utils::{configure_telemetry, init_logging, normalize_path};

use crate::{
    args::TryOnArgs,
    config::{apply_cli_overrides, load_settings, resolve_model},
    stills::run_stills_mode,
    webcam::run_webcam_mode,
};

fn main() -> Result<()> {
    init_logging(LevelFilter::Info)?;
    let args = TryOnArgs::parse();

    let mut settings = load_settings(args.config.as_ref())?;
    apply_cli_overrides(&mut settings, &args);
    configure_telemetry(
        settings.telemetry.enabled,
        settings.telemetry.level_filter(),
    );

    let loader = Arc::new(face_mesh_loader());
    if args.webcam {
        let model_path = resolve_model(&settings.resolved_model_path())?;
        return run_webcam_mode(&args, &settings, &model_path, loader);
    }

    let input = args
        .input
        .as_ref()
        .context("--input is required unless --webcam is given")?;
    let input = normalize_path(input)?;
    run_stills_mode(&args, &input, &settings, &loader)
}
