//! Scripted camera and detector doubles shared by the session tests.
#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::Receiver,
    },
    time::Duration,
};

use anyhow::Result;
use image::{DynamicImage, Rgba, RgbaImage};
use tryon_core::{
    DetectionResult, DetectorOptions, FrameSource, LandmarkDetector, LandmarkSet,
    OverlayAssets, OverlayImage, SessionEvent, SessionFactories,
};
use tryon_utils::{CameraSettings, load_fixture_json};

/// Counters observed by the tests after the worker thread is gone.
#[derive(Debug, Default)]
pub struct Probe {
    pub cameras_opened: AtomicUsize,
    pub cameras_stopped: AtomicUsize,
    pub detectors_created: AtomicUsize,
    pub detectors_closed: AtomicUsize,
    pub frames_sent: AtomicUsize,
    pub last_options: Mutex<Option<DetectorOptions>>,
    pub fail_camera: AtomicBool,
    pub fail_detection: AtomicBool,
}

impl Probe {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Camera producing solid frames whose red channel is the frame number.
pub struct ScriptedCamera {
    probe: Arc<Probe>,
    produced: u8,
    fail_after: Option<u8>,
}

impl FrameSource for ScriptedCamera {
    fn capture_frame(&mut self) -> Result<DynamicImage> {
        if self.fail_after.is_some_and(|limit| self.produced >= limit) {
            anyhow::bail!("camera unplugged");
        }
        self.produced = self.produced.wrapping_add(1);
        std::thread::sleep(Duration::from_millis(1));
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            64,
            48,
            Rgba([self.produced, 0, 0, 255]),
        )))
    }

    fn stop(&mut self) -> Result<()> {
        self.probe.cameras_stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Detector reporting the fixture face on every frame, or failing every frame when asked to.
pub struct FixtureDetector {
    probe: Arc<Probe>,
    face: LandmarkSet,
}

impl LandmarkDetector for FixtureDetector {
    fn set_options(&mut self, options: DetectorOptions) {
        *self.probe.last_options.lock().unwrap() = Some(options);
    }

    fn send(&mut self, frame: DynamicImage) -> Result<DetectionResult> {
        self.probe.frames_sent.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_detection.load(Ordering::SeqCst) {
            anyhow::bail!("inference backend crashed");
        }
        Ok(DetectionResult {
            image: Some(frame),
            multi_face_landmarks: vec![self.face.clone()],
        })
    }

    fn close(&mut self) {
        self.probe.detectors_closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn fixture_face() -> LandmarkSet {
    let points: Vec<[f32; 3]> =
        load_fixture_json("landmarks/frontal_face.json").expect("landmark fixture");
    LandmarkSet::from(points)
}

pub fn scripted_factories(probe: Arc<Probe>, fail_after: Option<u8>) -> SessionFactories {
    let camera_probe = probe.clone();
    let face = fixture_face();
    SessionFactories::new(
        move |_: &CameraSettings| {
            if camera_probe.fail_camera.load(Ordering::SeqCst) {
                anyhow::bail!("no camera attached");
            }
            camera_probe.cameras_opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedCamera {
                probe: camera_probe.clone(),
                produced: 0,
                fail_after,
            }) as Box<dyn FrameSource>)
        },
        move |_: &DetectorOptions| {
            probe.detectors_created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixtureDetector {
                probe: probe.clone(),
                face: face.clone(),
            }) as Box<dyn LandmarkDetector>)
        },
    )
}

pub fn solid_assets() -> OverlayAssets {
    OverlayAssets::new(
        OverlayImage::from_image("earring.png", RgbaImage::from_pixel(8, 8, Rgba([255, 215, 0, 255]))),
        OverlayImage::from_image("necklace.png", RgbaImage::from_pixel(8, 4, Rgba([192, 192, 192, 255]))),
    )
}

/// Collect events until `Stopped` or the timeout.
pub fn drain_until_stopped(rx: &Receiver<SessionEvent>, timeout: Duration) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.recv_timeout(timeout) {
        let stopped = matches!(event, SessionEvent::Stopped);
        events.push(event);
        if stopped {
            break;
        }
    }
    events
}
