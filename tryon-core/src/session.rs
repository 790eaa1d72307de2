//! One running camera -> detector -> compositor pipeline on a worker thread.
//!
//! Camera and detector are created by injected factories on the worker thread and are always
//! released there: the camera stream is stopped and the detector closed before the thread exits,
//! whether it ends because of [`TryOnSession::stop`], a setup error, or a capture failure.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use image::RgbaImage;
use log::{debug, error, info, warn};
use tryon_utils::{AppSettings, CameraSettings, WebcamCapture, timing_guard};

use crate::{
    compositor::{Compositor, OverlayLayout},
    detector::{DetectionResult, DetectorOptions, FrameSource, LandmarkDetector},
    face_mesh::FaceMeshDetector,
    landmarks::JewelryAnchors,
    loader::ResourceLoader,
    model::FaceMeshModel,
    overlay::OverlayAssets,
};

pub type CameraFactory = Arc<dyn Fn(&CameraSettings) -> Result<Box<dyn FrameSource>> + Send + Sync>;
pub type DetectorFactory =
    Arc<dyn Fn(&DetectorOptions) -> Result<Box<dyn LandmarkDetector>> + Send + Sync>;

/// Callback invoked with every detection result; its event (if any) is forwarded to the sink.
pub type ResultCallback = Box<dyn FnMut(DetectionResult) -> Option<SessionEvent> + Send>;

/// Builders for the camera and detector a session runs with.
#[derive(Clone)]
pub struct SessionFactories {
    pub camera: CameraFactory,
    pub detector: DetectorFactory,
}

impl SessionFactories {
    pub fn new<C, D>(camera: C, detector: D) -> Self
    where
        C: Fn(&CameraSettings) -> Result<Box<dyn FrameSource>> + Send + Sync + 'static,
        D: Fn(&DetectorOptions) -> Result<Box<dyn LandmarkDetector>> + Send + Sync + 'static,
    {
        Self {
            camera: Arc::new(camera),
            detector: Arc::new(detector),
        }
    }

    /// Webcam frames fed to the face-mesh model at `model_path`, loaded once through `loader`.
    pub fn native(model_path: PathBuf, loader: Arc<ResourceLoader<FaceMeshModel>>) -> Self {
        let source = model_path.to_string_lossy().into_owned();
        Self::new(
            |settings: &CameraSettings| {
                let camera = WebcamCapture::open(settings)?;
                Ok(Box::new(camera) as Box<dyn FrameSource>)
            },
            move |options: &DetectorOptions| {
                let model = loader.ensure(&source)?;
                Ok(Box::new(FaceMeshDetector::new(model, *options)) as Box<dyn LandmarkDetector>)
            },
        )
    }
}

impl std::fmt::Debug for SessionFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactories").finish_non_exhaustive()
    }
}

/// A loader that reads face-mesh models from disk, keyed by path.
pub fn face_mesh_loader() -> ResourceLoader<FaceMeshModel> {
    ResourceLoader::new(|source: &str| FaceMeshModel::load(source))
}

/// Everything a session needs besides its factories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub camera: CameraSettings,
    pub detector: DetectorOptions,
    pub layout: OverlayLayout,
    /// Stop after this many frames.
    pub frame_limit: Option<u64>,
    /// Minimum time between frames; zero disables pacing.
    pub frame_interval: Duration,
}

impl SessionConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            camera: settings.camera,
            detector: DetectorOptions::from(&settings.detector),
            layout: OverlayLayout::from(&settings.layout),
            frame_limit: None,
            frame_interval: Duration::from_millis(1000 / u64::from(settings.camera.fps.max(1))),
        }
    }
}

/// A composited frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// 1-based frame number within the session.
    pub index: u64,
    pub canvas: RgbaImage,
    pub faces: usize,
    /// Anchors of the first face, in unmirrored normalized coordinates.
    pub anchors: Option<JewelryAnchors>,
}

/// Progress reported by a session worker.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Camera and detector are ready.
    Started,
    Frame(FrameReport),
    /// The session failed; it stops right after.
    Error(String),
    /// The worker released camera and detector and exited.
    Stopped,
}

/// The default result callback: composite every result onto the canvas.
pub fn compositing_callback(layout: OverlayLayout, assets: OverlayAssets) -> ResultCallback {
    let mut compositor = Compositor::new(layout);
    let mut index = 0u64;
    Box::new(move |result: DetectionResult| {
        index += 1;
        let canvas = compositor.render(&result, &assets).clone();
        Some(SessionEvent::Frame(FrameReport {
            index,
            canvas,
            faces: result.multi_face_landmarks.len(),
            anchors: result.primary_face().and_then(|face| face.anchors()),
        }))
    })
}

/// Handle to a running session. Dropping it stops the session.
pub struct TryOnSession {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TryOnSession {
    /// Start a session that composites `assets` over every frame.
    pub fn start(
        config: SessionConfig,
        factories: SessionFactories,
        assets: OverlayAssets,
        sink: Sender<SessionEvent>,
    ) -> Result<Self> {
        let callback = compositing_callback(config.layout, assets);
        Self::start_with_callback(config, factories, callback, sink)
    }

    /// Start a session that hands every detection result to `callback`.
    pub fn start_with_callback(
        config: SessionConfig,
        factories: SessionFactories,
        callback: ResultCallback,
        sink: Sender<SessionEvent>,
    ) -> Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let worker_stop = stop_flag.clone();
        let handle = thread::Builder::new()
            .name("tryon-session".into())
            .spawn(move || {
                let worker = Worker {
                    config,
                    callback,
                    sink,
                    stop_flag: worker_stop,
                };
                worker.run(&factories);
            })
            .context("failed to spawn try-on session thread")?;

        Ok(Self {
            stop_flag,
            handle: Some(handle),
        })
    }

    /// Whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the worker and wait for it to release camera and detector.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Try-on session thread panicked");
            }
            debug!("Try-on session joined");
        }
    }
}

impl Drop for TryOnSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    config: SessionConfig,
    callback: ResultCallback,
    sink: Sender<SessionEvent>,
    stop_flag: Arc<AtomicBool>,
}

/// Camera and detector of a running session, released on drop.
struct Pipeline {
    camera: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop() {
            warn!("Failed to stop camera: {err:#}");
        }
        self.detector.close();
        info!("Try-on session released camera and detector");
    }
}

impl Worker {
    fn run(mut self, factories: &SessionFactories) {
        if let Err(err) = self.run_pipeline(factories) {
            error!("Try-on session failed: {err:#}");
            let _ = self.sink.send(SessionEvent::Error(format!("{err:#}")));
        }
        let _ = self.sink.send(SessionEvent::Stopped);
    }

    fn run_pipeline(&mut self, factories: &SessionFactories) -> Result<()> {
        let mut pipeline = self.setup(factories)?;
        if self.sink.send(SessionEvent::Started).is_err() {
            return Ok(());
        }

        let mut frames = 0u64;
        while !self.stop_flag.load(Ordering::SeqCst) {
            if self.config.frame_limit.is_some_and(|limit| frames >= limit) {
                debug!("Frame limit of {frames} reached");
                break;
            }
            let started = Instant::now();
            let frame = pipeline.camera.capture_frame()?;
            frames += 1;

            let result = {
                let _guard = timing_guard("tryon_core::detect_frame", log::Level::Debug);
                match pipeline.detector.send(frame.clone()) {
                    Ok(result) => result,
                    Err(err) => {
                        warn!("Landmark detection failed on frame {frames}: {err:#}");
                        DetectionResult {
                            image: Some(frame),
                            multi_face_landmarks: Vec::new(),
                        }
                    }
                }
            };

            if let Some(event) = (self.callback)(result)
                && self.sink.send(event).is_err()
            {
                debug!("Session event receiver dropped; stopping");
                break;
            }

            let elapsed = started.elapsed();
            if elapsed < self.config.frame_interval {
                thread::sleep(self.config.frame_interval - elapsed);
            }
        }
        Ok(())
    }

    fn setup(&self, factories: &SessionFactories) -> Result<Pipeline> {
        let _guard = timing_guard("tryon_core::session_setup", log::Level::Debug);
        let mut detector = (factories.detector)(&self.config.detector)
            .context("failed to set up landmark detector")?;
        detector.set_options(self.config.detector);

        let camera = match (factories.camera)(&self.config.camera) {
            Ok(camera) => camera,
            Err(err) => {
                detector.close();
                return Err(err.context("failed to open camera"));
            }
        };
        Ok(Pipeline { camera, detector })
    }
}
