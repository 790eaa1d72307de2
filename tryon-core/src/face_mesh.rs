//! Face-mesh detector: square region of interest, landmark model, frame-space landmarks.

use std::sync::Arc;

use anyhow::Result;
use image::{DynamicImage, GenericImageView, RgbImage};
use log::{debug, warn};
use tryon_utils::{SquareRegion, crop_region_resized, timing_guard};

use crate::{
    detector::{DetectionResult, DetectorOptions, LandmarkDetector},
    landmarks::{Landmark, LandmarkSet, REFINED_FACE_MESH_POINTS},
    model::{FaceMeshModel, MeshOutput},
};

/// Growth applied to the landmark bounds when deriving the next frame's region of interest.
const TRACKING_ROI_SCALE: f32 = 1.5;

/// A landmark model that consumes square RGB crops.
pub trait MeshModel: Send + Sync {
    fn input_side(&self) -> u32;
    fn infer(&self, crop: &RgbImage) -> Result<MeshOutput>;
}

impl MeshModel for FaceMeshModel {
    fn input_side(&self) -> u32 {
        FaceMeshModel::input_side(self)
    }

    fn infer(&self, crop: &RgbImage) -> Result<MeshOutput> {
        self.run(crop)
    }
}

/// Single-face landmark detector that tracks the face between frames.
///
/// Without a tracked face the centre square of the frame is searched and the presence score must
/// reach `min_detection_confidence`. Once a face is found, the next frame is cropped around the
/// previous landmarks and must reach `min_tracking_confidence`; dropping below it resets the
/// tracker and the frame is searched again from the centre.
pub struct FaceMeshDetector<M = FaceMeshModel> {
    model: Arc<M>,
    options: DetectorOptions,
    tracked: Option<SquareRegion>,
    closed: bool,
    warned_unrefined: bool,
}

impl<M: MeshModel> FaceMeshDetector<M> {
    pub fn new(model: Arc<M>, options: DetectorOptions) -> Self {
        Self {
            model,
            options,
            tracked: None,
            closed: false,
            warned_unrefined: false,
        }
    }

    pub fn options(&self) -> DetectorOptions {
        self.options
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }

    fn locate(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>> {
        let (width, height) = frame.dimensions();
        if let Some(region) = self.tracked {
            if let Some(face) =
                self.run_region(frame, region, self.options.min_tracking_confidence)?
            {
                return Ok(Some(face));
            }
            debug!("Face tracking lost; searching the full frame");
            self.tracked = None;
        }

        let region = SquareRegion::centered(width, height);
        self.run_region(frame, region, self.options.min_detection_confidence)
    }

    fn run_region(
        &mut self,
        frame: &RgbImage,
        region: SquareRegion,
        threshold: f32,
    ) -> Result<Option<LandmarkSet>> {
        let crop = crop_region_resized(frame, region, self.model.input_side())?;
        let output = {
            let _guard = timing_guard("tryon_core::face_mesh_inference", log::Level::Debug);
            self.model.infer(&crop)?
        };
        if output.presence < threshold {
            return Ok(None);
        }

        let (width, height) = frame.dimensions();
        let face = to_frame_space(&output.landmarks, region, width, height);
        self.tracked = tracking_region(&face, width, height);
        Ok(Some(face))
    }

    fn apply_refinement(&mut self, face: &mut LandmarkSet) {
        if !self.options.refine_landmarks {
            face.truncate_to_base();
        } else if !face.is_refined() && !self.warned_unrefined {
            warn!(
                "Refined landmarks requested but the model produced {} of {} points",
                face.len(),
                REFINED_FACE_MESH_POINTS
            );
            self.warned_unrefined = true;
        }
    }
}

impl<M: MeshModel> LandmarkDetector for FaceMeshDetector<M> {
    fn set_options(&mut self, options: DetectorOptions) {
        self.options = options;
        self.tracked = None;
    }

    fn send(&mut self, frame: DynamicImage) -> Result<DetectionResult> {
        anyhow::ensure!(!self.closed, "face-mesh detector has been closed");
        let (width, height) = frame.dimensions();
        anyhow::ensure!(width > 0 && height > 0, "frame has zero size");

        let mut multi_face_landmarks = Vec::new();
        if self.options.max_num_faces == 0 {
            self.tracked = None;
        } else if let Some(mut face) = self.locate(&frame.to_rgb8())? {
            self.apply_refinement(&mut face);
            multi_face_landmarks.push(face);
        }

        Ok(DetectionResult {
            image: Some(frame),
            multi_face_landmarks,
        })
    }

    fn close(&mut self) {
        self.closed = true;
        self.tracked = None;
    }
}

/// Map crop-normalized landmarks back to normalized frame coordinates.
fn to_frame_space(points: &[Landmark], region: SquareRegion, width: u32, height: u32) -> LandmarkSet {
    let (w, h) = (width as f32, height as f32);
    LandmarkSet::new(
        points
            .iter()
            .map(|p| {
                Landmark::new(
                    (region.left() + p.x * region.side) / w,
                    (region.top() + p.y * region.side) / h,
                    p.z * region.side / w,
                )
            })
            .collect(),
    )
}

fn tracking_region(face: &LandmarkSet, width: u32, height: u32) -> Option<SquareRegion> {
    let bounds = face.bounds()?;
    let (cx, cy) = bounds.center();
    let longest = width.max(height) as f32 * TRACKING_ROI_SCALE;
    let side = ((bounds.width() * width as f32).max(bounds.height() * height as f32)
        * TRACKING_ROI_SCALE)
        .min(longest);
    (side >= 1.0).then_some(SquareRegion {
        center_x: cx * width as f32,
        center_y: cy * height as f32,
        side,
    })
}
