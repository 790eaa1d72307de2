//! The try-on controller: overlay images in, composited frames out.

use std::sync::mpsc::Sender;

use anyhow::Result;
use log::info;
use tryon_utils::{AppSettings, OverlaySettings};

use crate::{
    overlay::OverlayAssets,
    session::{SessionConfig, SessionEvent, SessionFactories, TryOnSession},
};

/// Owns the settings, overlay images and the running session.
///
/// Changing an overlay source reloads the images and, when a session is running, tears it down and
/// sets up a fresh one that streams to the same sink.
pub struct TryOn {
    settings: AppSettings,
    factories: SessionFactories,
    assets: OverlayAssets,
    session: Option<TryOnSession>,
    sink: Option<Sender<SessionEvent>>,
    setups: usize,
    frame_limit: Option<u64>,
}

impl TryOn {
    /// Create a controller and begin loading the configured overlay images.
    pub fn new(settings: AppSettings, factories: SessionFactories) -> Self {
        let assets = OverlayAssets::load(&settings.overlays);
        Self::with_assets(settings, factories, assets)
    }

    /// Create a controller around overlay images that are already loading (or loaded).
    pub fn with_assets(
        settings: AppSettings,
        factories: SessionFactories,
        assets: OverlayAssets,
    ) -> Self {
        Self {
            settings,
            factories,
            assets,
            session: None,
            sink: None,
            setups: 0,
            frame_limit: None,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn assets(&self) -> &OverlayAssets {
        &self.assets
    }

    /// Stop future sessions after `limit` frames.
    pub fn set_frame_limit(&mut self, limit: Option<u64>) {
        self.frame_limit = limit;
    }

    /// Point the overlays at new images. Returns whether anything changed.
    pub fn set_overlays(&mut self, earring: &str, necklace: &str) -> Result<bool> {
        let overlays = OverlaySettings {
            earring_image: earring.to_string(),
            necklace_image: necklace.to_string(),
        };
        if !self.assets.update_sources(&overlays) {
            return Ok(false);
        }
        info!("Overlay images changed to {earring} / {necklace}");
        self.settings.overlays = overlays;
        self.restart_if_running()?;
        Ok(true)
    }

    /// Switch the selfie view on or off, restarting a running session.
    pub fn set_mirror(&mut self, mirror: bool) -> Result<()> {
        if self.settings.layout.mirror == mirror {
            return Ok(());
        }
        self.settings.layout.mirror = mirror;
        self.restart_if_running()
    }

    /// Set up a session streaming events to `sink`, replacing any running one.
    pub fn start(&mut self, sink: Sender<SessionEvent>) -> Result<()> {
        self.stop();
        let mut config = SessionConfig::from_settings(&self.settings);
        config.frame_limit = self.frame_limit;
        let session = TryOnSession::start(
            config,
            self.factories.clone(),
            self.assets.clone(),
            sink.clone(),
        )?;
        self.setups += 1;
        self.session = Some(session);
        self.sink = Some(sink);
        Ok(())
    }

    /// Tear down the running session, if any.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.is_running())
    }

    /// Number of sessions set up so far.
    pub fn setup_count(&self) -> usize {
        self.setups
    }

    fn restart_if_running(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        match self.sink.clone() {
            Some(sink) => self.start(sink),
            None => Ok(()),
        }
    }
}

impl Drop for TryOn {
    fn drop(&mut self) {
        self.stop();
    }
}
