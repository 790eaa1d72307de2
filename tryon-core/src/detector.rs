//! The contract between the try-on pipeline and its landmark and frame providers.
//!
//! The pipeline never talks to a concrete model or camera; sessions receive boxed
//! [`LandmarkDetector`] and [`FrameSource`] values from injected factories.

use anyhow::Result;
use image::DynamicImage;
use tryon_utils::{DetectorSettings, WebcamCapture};

use crate::landmarks::LandmarkSet;

/// Options accepted by a landmark detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    pub max_num_faces: usize,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl From<&DetectorSettings> for DetectorOptions {
    fn from(settings: &DetectorSettings) -> Self {
        Self {
            max_num_faces: settings.max_num_faces,
            refine_landmarks: settings.refine_landmarks,
            min_detection_confidence: settings.min_detection_confidence,
            min_tracking_confidence: settings.min_tracking_confidence,
        }
    }
}

/// What a detector reports for one frame.
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    /// The frame the landmarks belong to, when the detector hands it back.
    pub image: Option<DynamicImage>,
    /// One landmark set per detected face, most confident first.
    pub multi_face_landmarks: Vec<LandmarkSet>,
}

impl DetectionResult {
    /// Landmarks of the face the jewelry is drawn on.
    pub fn primary_face(&self) -> Option<&LandmarkSet> {
        self.multi_face_landmarks.first()
    }
}

/// Something that turns frames into facial landmarks.
pub trait LandmarkDetector {
    fn set_options(&mut self, options: DetectorOptions);

    /// Process one frame. Results must be produced in the order frames are sent.
    fn send(&mut self, frame: DynamicImage) -> Result<DetectionResult>;

    /// Release resources held by the detector. Later `send` calls may fail.
    fn close(&mut self);
}

/// Something that yields camera frames until stopped.
pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<DynamicImage>;

    /// Stop the stream. Must be safe to call more than once.
    fn stop(&mut self) -> Result<()>;
}

impl FrameSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<DynamicImage> {
        WebcamCapture::capture_frame(self)
    }

    fn stop(&mut self) -> Result<()> {
        WebcamCapture::stop(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    #[test]
    fn default_options_match_demo_configuration() {
        let options = DetectorOptions::default();
        assert_eq!(options.max_num_faces, 1);
        assert!(options.refine_landmarks);
        assert_eq!(options.min_detection_confidence, 0.5);
        assert_eq!(options.min_tracking_confidence, 0.5);
        assert_eq!(options, DetectorOptions::from(&DetectorSettings::default()));
    }

    #[test]
    fn primary_face_is_first_set() {
        let first = LandmarkSet::new(vec![Landmark::new(0.1, 0.1, 0.0)]);
        let second = LandmarkSet::new(vec![Landmark::new(0.9, 0.9, 0.0)]);
        let result = DetectionResult {
            image: None,
            multi_face_landmarks: vec![first.clone(), second],
        };
        assert_eq!(result.primary_face(), Some(&first));
        assert!(DetectionResult::default().primary_face().is_none());
    }
}
