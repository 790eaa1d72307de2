//! Core of the jewelry try-on pipeline.
//!
//! Frames from a [`FrameSource`] are passed through a [`LandmarkDetector`]; each
//! [`DetectionResult`] is composited by the [`Compositor`], which hangs earrings from landmarks
//! 234 and 454 and a necklace from landmark 152.

/// Canvas composition and overlay placement.
pub mod compositor;
/// Detector and camera contracts.
pub mod detector;
/// Face-mesh detector with frame-to-frame tracking.
pub mod face_mesh;
/// Landmark sets and jewelry anchors.
pub mod landmarks;
/// Load-once resource cache.
pub mod loader;
/// ONNX face-mesh model execution.
pub mod model;
/// Background-loaded overlay images.
pub mod overlay;
/// Worker-thread pipeline with guaranteed teardown.
pub mod session;
/// The try-on controller.
pub mod tryon;

pub use compositor::{Compositor, DrawOp, OverlayLayout, Placement, plan};
pub use detector::{DetectionResult, DetectorOptions, FrameSource, LandmarkDetector};
pub use face_mesh::{FaceMeshDetector, MeshModel};
pub use landmarks::{
    CHIN, FACE_MESH_POINTS, JewelryAnchors, LEFT_EAR, Landmark, LandmarkBounds, LandmarkSet,
    REFINED_FACE_MESH_POINTS, RIGHT_EAR,
};
pub use loader::{LoadError, ResourceLoader};
pub use model::{FaceMeshModel, MeshOutput, TensorLayout};
pub use overlay::{OverlayAssets, OverlayImage};
pub use session::{
    CameraFactory, DetectorFactory, FrameReport, ResultCallback, SessionConfig, SessionEvent,
    SessionFactories, TryOnSession, compositing_callback, face_mesh_loader,
};
pub use tryon::TryOn;

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
