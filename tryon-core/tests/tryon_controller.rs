mod common;

use std::{
    sync::{Arc, mpsc},
    time::Duration,
};

use common::{Probe, drain_until_stopped, scripted_factories, solid_assets};
use tryon_core::{
    DetectorOptions, LandmarkDetector, ResourceLoader, SessionEvent, SessionFactories, TryOn,
};
use tryon_utils::AppSettings;

fn settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.layout.canvas_width = 64;
    settings.layout.canvas_height = 48;
    settings.camera.fps = 1000;
    settings
}

#[test]
fn changing_overlays_restarts_a_running_session() {
    let probe = Arc::new(Probe::default());
    let mut tryon = TryOn::with_assets(
        settings(),
        scripted_factories(probe.clone(), None),
        solid_assets(),
    );
    let (tx, rx) = mpsc::channel();
    tryon.start(tx).expect("start");
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(5)),
        Ok(SessionEvent::Started)
    ));
    assert_eq!(tryon.setup_count(), 1);

    let changed = tryon
        .set_overlays("missing/hoops.png", "missing/pearls.png")
        .expect("set overlays");
    assert!(changed);
    assert_eq!(tryon.setup_count(), 2);
    // Old session: frames then Stopped. New session: Started.
    loop {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(SessionEvent::Started) => break,
            Ok(_) => continue,
            Err(err) => panic!("second session never started: {err}"),
        }
    }
    assert!(!tryon.assets().earring.is_complete());
    assert_eq!(tryon.settings().overlays.earring_image, "missing/hoops.png");
    // The first session was torn down before the second came up.
    assert_eq!(Probe::count(&probe.cameras_stopped), 1);
    assert_eq!(Probe::count(&probe.detectors_created), 2);

    tryon.stop();
    assert!(!tryon.is_running());
    assert_eq!(Probe::count(&probe.detectors_closed), 2);
}

#[test]
fn unchanged_overlays_do_not_restart() {
    let probe = Arc::new(Probe::default());
    let mut tryon = TryOn::with_assets(
        settings(),
        scripted_factories(probe.clone(), None),
        solid_assets(),
    );
    let (tx, _rx) = mpsc::channel();
    tryon.start(tx).expect("start");

    assert!(!tryon.set_overlays("earring.png", "necklace.png").expect("same"));
    assert_eq!(tryon.setup_count(), 1);
}

#[test]
fn overlay_change_while_idle_only_reloads() {
    let probe = Arc::new(Probe::default());
    let mut tryon = TryOn::with_assets(
        settings(),
        scripted_factories(probe.clone(), None),
        solid_assets(),
    );
    assert!(tryon.set_overlays("a.png", "b.png").expect("set"));
    assert_eq!(tryon.setup_count(), 0);
    assert_eq!(Probe::count(&probe.detectors_created), 0);
}

#[test]
fn frame_limit_ends_the_session() {
    let probe = Arc::new(Probe::default());
    let mut tryon = TryOn::with_assets(
        settings(),
        scripted_factories(probe.clone(), None),
        solid_assets(),
    );
    tryon.set_frame_limit(Some(3));
    let (tx, rx) = mpsc::channel();
    tryon.start(tx).expect("start");

    let frames = drain_until_stopped(&rx, Duration::from_secs(5))
        .iter()
        .filter(|event| matches!(event, SessionEvent::Frame(_)))
        .count();
    assert_eq!(frames, 3);
    assert_eq!(Probe::count(&probe.frames_sent), 3);
}

#[test]
fn model_is_loaded_once_across_sessions() {
    let probe = Arc::new(Probe::default());
    let loader = Arc::new(ResourceLoader::new(|source: &str| Ok(source.to_string())));
    let scripted = scripted_factories(probe, None);

    let detector_loader = loader.clone();
    let inner = scripted.detector.clone();
    let factories = SessionFactories {
        camera: scripted.camera.clone(),
        detector: Arc::new(
            move |options: &DetectorOptions| -> anyhow::Result<Box<dyn LandmarkDetector>> {
                detector_loader.ensure("models/face_landmark.onnx")?;
                inner(options)
            },
        ),
    };

    let mut tryon = TryOn::with_assets(settings(), factories, solid_assets());
    tryon.set_frame_limit(Some(1));
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel();
        tryon.start(tx).expect("start");
        drain_until_stopped(&rx, Duration::from_secs(5));
    }

    assert_eq!(tryon.setup_count(), 3);
    assert_eq!(loader.load_count(), 1);
}

#[test]
fn load_failures_surface_as_session_errors() {
    let probe = Arc::new(Probe::default());
    let loader = Arc::new(ResourceLoader::<String>::new(|_| {
        anyhow::bail!("model missing")
    }));
    let scripted = scripted_factories(probe, None);
    let detector_loader = loader.clone();
    let factories = SessionFactories {
        camera: scripted.camera.clone(),
        detector: Arc::new(
            move |_: &DetectorOptions| -> anyhow::Result<Box<dyn LandmarkDetector>> {
                detector_loader.ensure("models/face_landmark.onnx")?;
                anyhow::bail!("unreachable")
            },
        ),
    };

    let mut tryon = TryOn::with_assets(settings(), factories, solid_assets());
    let (tx, rx) = mpsc::channel();
    tryon.start(tx).expect("start");

    let events = drain_until_stopped(&rx, Duration::from_secs(5));
    let SessionEvent::Error(message) = &events[0] else {
        panic!("expected error, got {:?}", events[0]);
    };
    assert!(message.contains("failed to load resource: models/face_landmark.onnx"));
}
