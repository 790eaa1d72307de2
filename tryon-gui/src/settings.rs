//! Settings persistence and loading.

use anyhow::{Context, Result};
use log::warn;
use std::path::Path;
use tryon_utils::AppSettings;

/// Load settings from `path`, falling back to defaults when the file is missing or invalid.
pub fn load_settings(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }
    match AppSettings::load_from_path(path) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(
                "Failed to load settings from {}: {err:#}. Falling back to defaults.",
                path.display()
            );
            AppSettings::default()
        }
    }
}

/// Save the current settings as JSON.
pub fn persist_settings(settings: &AppSettings, settings_path: &Path) -> Result<()> {
    settings
        .save_to_path(settings_path)
        .with_context(|| format!("failed to write settings to {}", settings_path.display()))
}
