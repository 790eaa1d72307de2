//! Jewelry images decoded in the background, with a completion flag the compositor checks.

use std::{
    path::PathBuf,
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use image::RgbaImage;
use log::{debug, warn};
use tryon_utils::{OverlaySettings, load_image};

#[derive(Debug, Default)]
enum LoadState {
    #[default]
    Pending,
    Ready(Arc<RgbaImage>),
    Failed(String),
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<LoadState>,
    changed: Condvar,
}

impl Shared {
    fn settle(&self, next: LoadState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, LoadState::Pending) {
            *state = next;
            self.changed.notify_all();
        }
    }
}

/// An overlay image and its load state.
///
/// Clones share the same load. A failed load never completes; the compositor simply keeps
/// skipping the image.
#[derive(Debug, Clone)]
pub struct OverlayImage {
    source: String,
    shared: Arc<Shared>,
}

impl OverlayImage {
    /// Start decoding `source` on a background thread.
    pub fn load(source: impl Into<String>) -> Self {
        let overlay = Self::pending(source);
        let shared = overlay.shared.clone();
        let path = PathBuf::from(&overlay.source);

        let spawned = thread::Builder::new()
            .name("overlay-loader".into())
            .spawn(move || {
                let next = match load_image(&path) {
                    Ok(image) => {
                        debug!(
                            "Overlay {} decoded ({}x{})",
                            path.display(),
                            image.width(),
                            image.height()
                        );
                        LoadState::Ready(Arc::new(image.to_rgba8()))
                    }
                    Err(err) => {
                        warn!("Overlay image unavailable: {err:#}");
                        LoadState::Failed(format!("{err:#}"))
                    }
                };
                shared.settle(next);
            });
        if let Err(err) = spawned {
            warn!("Could not start overlay loader for {}: {err}", overlay.source);
            overlay
                .shared
                .settle(LoadState::Failed(format!("loader thread failed: {err}")));
        }
        overlay
    }

    /// An overlay that is already decoded.
    pub fn from_image(source: impl Into<String>, image: RgbaImage) -> Self {
        let overlay = Self::pending(source);
        overlay.shared.settle(LoadState::Ready(Arc::new(image)));
        overlay
    }

    /// An overlay whose load has not finished yet.
    pub fn pending(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            shared: Arc::default(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the image decoded successfully.
    pub fn is_complete(&self) -> bool {
        matches!(*self.lock(), LoadState::Ready(_))
    }

    /// Whether the load is still in progress.
    pub fn is_pending(&self) -> bool {
        matches!(*self.lock(), LoadState::Pending)
    }

    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        match &*self.lock() {
            LoadState::Ready(image) => Some(image.clone()),
            _ => None,
        }
    }

    /// Error message of a failed load.
    pub fn error(&self) -> Option<String> {
        match &*self.lock() {
            LoadState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Block until the load settles or `timeout` passes. Returns [`Self::is_complete`].
    pub fn wait_until_loaded(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while matches!(*state, LoadState::Pending) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            state = self
                .shared
                .changed
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        matches!(*state, LoadState::Ready(_))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LoadState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// The earring and necklace images currently in use.
#[derive(Debug, Clone)]
pub struct OverlayAssets {
    pub earring: OverlayImage,
    pub necklace: OverlayImage,
}

impl OverlayAssets {
    pub fn new(earring: OverlayImage, necklace: OverlayImage) -> Self {
        Self { earring, necklace }
    }

    /// Start loading both images named in `settings`.
    pub fn load(settings: &OverlaySettings) -> Self {
        Self::new(
            OverlayImage::load(&settings.earring_image),
            OverlayImage::load(&settings.necklace_image),
        )
    }

    /// Whether these assets were loaded from exactly these sources.
    pub fn matches(&self, settings: &OverlaySettings) -> bool {
        self.earring.source == settings.earring_image
            && self.necklace.source == settings.necklace_image
    }

    /// Reload both images when either source changed. Returns whether a reload happened.
    pub fn update_sources(&mut self, settings: &OverlaySettings) -> bool {
        if self.matches(settings) {
            return false;
        }
        debug!(
            "Overlay sources changed to {} / {}",
            settings.earring_image, settings.necklace_image
        );
        *self = Self::load(settings);
        true
    }

    /// Block until both loads settle or `timeout` passes.
    pub fn wait_until_loaded(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let earring = self.earring.wait_until_loaded(timeout);
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.necklace.wait_until_loaded(remaining) && earring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn pending_overlay_completes_once() {
        let overlay = OverlayImage::pending("earring.png");
        let clone = overlay.clone();
        assert!(!overlay.is_complete());
        assert!(overlay.is_pending());
        assert!(!overlay.wait_until_loaded(Duration::from_millis(10)));

        overlay
            .shared
            .settle(LoadState::Ready(Arc::new(RgbaImage::new(2, 2))));
        overlay.shared.settle(LoadState::Failed("late".into()));
        assert!(clone.is_complete());
        assert!(clone.error().is_none());
    }

    #[test]
    fn background_load_decodes_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("earring.png");
        RgbaImage::from_pixel(3, 5, Rgba([255, 215, 0, 255]))
            .save(&path)
            .expect("save png");

        let overlay = OverlayImage::load(path.to_string_lossy());
        assert!(overlay.wait_until_loaded(Duration::from_secs(5)));
        let image = overlay.image().expect("image");
        assert_eq!(image.dimensions(), (3, 5));
    }

    #[test]
    fn failed_load_never_completes() {
        let overlay = OverlayImage::load("missing/necklace.png");
        assert!(!overlay.wait_until_loaded(Duration::from_secs(5)));
        assert!(!overlay.is_complete());
        assert!(!overlay.is_pending());
        assert!(overlay.error().is_some());
    }

    #[test]
    fn update_sources_reloads_only_on_change() {
        let settings = OverlaySettings {
            earring_image: "a.png".into(),
            necklace_image: "b.png".into(),
        };
        let mut assets = OverlayAssets::new(
            OverlayImage::from_image("a.png", RgbaImage::new(1, 1)),
            OverlayImage::from_image("b.png", RgbaImage::new(1, 1)),
        );
        assert!(!assets.update_sources(&settings));
        assert!(assets.earring.is_complete());

        let changed = OverlaySettings {
            necklace_image: "missing/c.png".into(),
            ..settings
        };
        assert!(assets.update_sources(&changed));
        assert_eq!(assets.necklace.source(), "missing/c.png");
        assert!(!assets.necklace.is_complete());
    }

    #[test]
    fn update_sources_starts_a_fresh_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("hoops.png");
        RgbaImage::from_pixel(3, 5, Rgba([255, 215, 0, 255]))
            .save(&path)
            .expect("save png");

        let mut assets = OverlayAssets::new(
            OverlayImage::from_image("a.png", RgbaImage::new(1, 1)),
            OverlayImage::from_image("b.png", RgbaImage::new(1, 1)),
        );
        let changed = OverlaySettings {
            earring_image: path.to_string_lossy().into_owned(),
            necklace_image: "b.png".into(),
        };
        assert!(assets.update_sources(&changed));

        // The previous decoded image never carries over, even while the new load is in flight.
        assert!(assets.earring.error().is_none());
        assert!(
            assets
                .earring
                .image()
                .is_none_or(|image| image.dimensions() == (3, 5))
        );
        assert!(assets.earring.wait_until_loaded(Duration::from_secs(5)));
        assert!(assets.earring.is_complete());
        assert_eq!(assets.earring.image().expect("image").dimensions(), (3, 5));
        // Unchanged sources are reloaded too.
        assert!(!assets.necklace.is_complete());
    }
}
