//! Application state and session event handling.

use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use eframe::{App, Frame};
use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureOptions};
use image::RgbaImage;
use log::{error, info, warn};
use tryon_core::{SessionEvent, SessionFactories, TryOn};
use tryon_utils::{AppSettings, configure_telemetry};

use crate::{
    settings::{load_settings, persist_settings},
    theme,
};

/// Lifecycle of the camera session as shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Starting,
    Running,
    Error,
}

/// The try-on window.
pub struct TryOnApp {
    pub settings: AppSettings,
    pub settings_path: PathBuf,
    pub status: SessionStatus,
    pub status_line: String,
    pub last_error: Option<String>,
    pub earring_input: String,
    pub necklace_input: String,
    pub frames_shown: u64,
    pub faces_in_view: usize,
    pub(crate) canvas_texture: Option<TextureHandle>,
    tryon: TryOn,
    /// `Stopped` events still owed by workers replaced through a restart.
    replaced_sessions: usize,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
}

impl TryOnApp {
    /// Build the app from the settings at `settings_path` with the given camera and detector.
    pub fn create(
        ctx: &EguiContext,
        settings_path: PathBuf,
        factories: impl FnOnce(&AppSettings) -> SessionFactories,
    ) -> Self {
        theme::apply(ctx);

        info!("Loading settings from {}", settings_path.display());
        let settings = load_settings(&settings_path);
        configure_telemetry(
            settings.telemetry.enabled,
            settings.telemetry.level_filter(),
        );

        let tryon = TryOn::new(settings.clone(), factories(&settings));
        let (event_tx, event_rx) = mpsc::channel();

        Self {
            earring_input: settings.overlays.earring_image.clone(),
            necklace_input: settings.overlays.necklace_image.clone(),
            settings,
            settings_path,
            status: SessionStatus::Idle,
            status_line: "Press Start to open the camera.".to_owned(),
            last_error: None,
            frames_shown: 0,
            faces_in_view: 0,
            canvas_texture: None,
            tryon,
            replaced_sessions: 0,
            event_tx,
            event_rx,
        }
    }

    /// Whether the earring and necklace images have finished loading.
    pub fn overlays_ready(&self) -> (bool, bool) {
        let assets = self.tryon.assets();
        (assets.earring.is_complete(), assets.necklace.is_complete())
    }

    /// Load errors of the earring and necklace images.
    pub fn overlay_errors(&self) -> (Option<String>, Option<String>) {
        let assets = self.tryon.assets();
        (assets.earring.error(), assets.necklace.error())
    }

    fn overlays_pending(&self) -> bool {
        let assets = self.tryon.assets();
        assets.earring.is_pending() || assets.necklace.is_pending()
    }

    pub fn setup_count(&self) -> usize {
        self.tryon.setup_count()
    }

    pub fn start_session(&mut self) {
        if matches!(self.status, SessionStatus::Starting | SessionStatus::Running) {
            return;
        }
        self.last_error = None;
        self.frames_shown = 0;
        match self.tryon.start(self.event_tx.clone()) {
            Ok(()) => {
                self.status = SessionStatus::Starting;
                self.status_line = "Opening camera and loading the face model...".to_owned();
            }
            Err(err) => self.fail(format!("Could not start the camera: {err:#}")),
        }
    }

    pub fn stop_session(&mut self) {
        self.tryon.stop();
        // Drop whatever the stopped worker queued.
        while self.event_rx.try_recv().is_ok() {}
        self.replaced_sessions = 0;
        if self.status != SessionStatus::Error {
            self.status = SessionStatus::Idle;
            self.status_line = "Camera stopped.".to_owned();
        }
    }

    /// Push the overlay path inputs to the controller. Returns whether the images changed.
    pub fn apply_overlay_inputs(&mut self) -> bool {
        let earring = self.earring_input.trim().to_owned();
        let necklace = self.necklace_input.trim().to_owned();
        let setups = self.setup_count();
        match self.tryon.set_overlays(&earring, &necklace) {
            Ok(false) => false,
            Ok(true) => {
                self.note_restart(setups);
                self.settings.overlays = self.tryon.settings().overlays.clone();
                self.status_line = "Loading jewelry images...".to_owned();
                self.persist();
                true
            }
            Err(err) => {
                self.fail(format!("Could not restart with the new jewelry: {err:#}"));
                true
            }
        }
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        let setups = self.setup_count();
        match self.tryon.set_mirror(mirror) {
            Ok(()) => self.note_restart(setups),
            Err(err) => self.fail(format!("Could not restart the camera: {err:#}")),
        }
        self.settings.layout.mirror = mirror;
        self.persist();
    }

    /// A restart joins the old worker before the new one starts, so its `Stopped` is queued
    /// ahead of the new `Started` and must not reset the status.
    fn note_restart(&mut self, setups_before: usize) {
        if self.setup_count() > setups_before {
            self.replaced_sessions += 1;
            self.status = SessionStatus::Starting;
        }
    }

    /// Drain session events and update the canvas texture.
    pub fn poll_session(&mut self, ctx: &EguiContext) {
        let mut updated = false;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(ctx, event);
            updated = true;
        }
        if updated {
            ctx.request_repaint();
        }
    }

    fn handle_event(&mut self, ctx: &EguiContext, event: SessionEvent) {
        match event {
            SessionEvent::Started => {
                self.status = SessionStatus::Running;
                self.status_line = "Camera running.".to_owned();
            }
            SessionEvent::Frame(report) => {
                self.frames_shown = report.index;
                self.faces_in_view = report.faces;
                self.show_canvas(ctx, &report.canvas);
            }
            SessionEvent::Error(message) => self.fail(message),
            SessionEvent::Stopped if self.replaced_sessions > 0 => {
                self.replaced_sessions -= 1;
            }
            SessionEvent::Stopped => {
                if self.status != SessionStatus::Error {
                    self.status = SessionStatus::Idle;
                    self.status_line = "Camera stopped.".to_owned();
                }
            }
        }
    }

    fn show_canvas(&mut self, ctx: &EguiContext, canvas: &RgbaImage) {
        let size = [canvas.width() as usize, canvas.height() as usize];
        let color_image = ColorImage::from_rgba_unmultiplied(size, canvas.as_raw());
        match self.canvas_texture.as_mut() {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => {
                self.canvas_texture =
                    Some(ctx.load_texture("tryon-canvas", color_image, TextureOptions::LINEAR));
            }
        }
    }

    fn fail(&mut self, message: String) {
        error!("{message}");
        self.status = SessionStatus::Error;
        self.status_line = "Camera stopped after an error.".to_owned();
        self.last_error = Some(message);
    }

    fn persist(&mut self) {
        if let Err(err) = persist_settings(&self.settings, &self.settings_path) {
            warn!("{err:#}");
            self.last_error = Some(format!("Failed to save settings: {err:#}"));
        }
    }
}

impl App for TryOnApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        self.poll_session(ctx);
        self.show_header(ctx);
        self.show_controls(ctx);
        self.show_canvas_panel(ctx);

        if matches!(self.status, SessionStatus::Starting | SessionStatus::Running)
            || self.overlays_pending()
        {
            ctx.request_repaint_after(Duration::from_millis(15));
        }
    }
}
