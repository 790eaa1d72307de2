//! Face-mesh landmark sets and the anchor points the jewelry is hung from.

use serde::{Deserialize, Serialize};

/// Point count of the base face-mesh topology.
pub const FACE_MESH_POINTS: usize = 468;
/// Point count once the ten iris points are appended.
pub const REFINED_FACE_MESH_POINTS: usize = 478;

/// Index of the landmark on the left side of the face near the ear.
pub const LEFT_EAR: usize = 234;
/// Index of the landmark on the right side of the face near the ear.
pub const RIGHT_EAR: usize = 454;
/// Index of the chin landmark.
pub const CHIN: usize = 152;

/// One landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The same point seen in a horizontally flipped frame.
    pub fn mirrored(self) -> Self {
        Self {
            x: 1.0 - self.x,
            ..self
        }
    }

    /// Scale the normalized point onto a `width x height` surface.
    pub fn to_pixels(self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// The three landmarks the compositor places jewelry on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JewelryAnchors {
    pub left_ear: Landmark,
    pub right_ear: Landmark,
    pub chin: Landmark,
}

impl JewelryAnchors {
    pub fn mirrored(self) -> Self {
        Self {
            left_ear: self.left_ear.mirrored(),
            right_ear: self.right_ear.mirrored(),
            chin: self.chin.mirrored(),
        }
    }
}

/// Axis-aligned bounds of a landmark set in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl LandmarkBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Landmarks of one detected face, in face-mesh index order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Whether the ten iris points are present.
    pub fn is_refined(&self) -> bool {
        self.points.len() >= REFINED_FACE_MESH_POINTS
    }

    /// Drop everything past the base topology (the iris points).
    pub fn truncate_to_base(&mut self) {
        self.points.truncate(FACE_MESH_POINTS);
    }

    /// Ear and chin anchors, or `None` when the set is too short to contain them.
    pub fn anchors(&self) -> Option<JewelryAnchors> {
        Some(JewelryAnchors {
            left_ear: self.get(LEFT_EAR)?,
            right_ear: self.get(RIGHT_EAR)?,
            chin: self.get(CHIN)?,
        })
    }

    /// Bounds of the base topology, ignoring iris points.
    pub fn bounds(&self) -> Option<LandmarkBounds> {
        let mut iter = self.points.iter().take(FACE_MESH_POINTS);
        let first = iter.next()?;
        let init = LandmarkBounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(iter.fold(init, |acc, p| LandmarkBounds {
            min_x: acc.min_x.min(p.x),
            min_y: acc.min_y.min(p.y),
            max_x: acc.max_x.max(p.x),
            max_y: acc.max_y.max(p.y),
        }))
    }
}

impl From<Vec<[f32; 3]>> for LandmarkSet {
    fn from(points: Vec<[f32; 3]>) -> Self {
        Self::new(points.into_iter().map(Landmark::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_with(anchors: &[(usize, Landmark)]) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); FACE_MESH_POINTS];
        for &(index, landmark) in anchors {
            points[index] = landmark;
        }
        LandmarkSet::new(points)
    }

    #[test]
    fn anchors_pick_ear_and_chin_indices() {
        let face = face_with(&[
            (LEFT_EAR, Landmark::new(0.3, 0.4, 0.0)),
            (RIGHT_EAR, Landmark::new(0.7, 0.41, 0.0)),
            (CHIN, Landmark::new(0.5, 0.8, 0.0)),
        ]);
        let anchors = face.anchors().expect("anchors");
        assert_eq!(anchors.left_ear.x, 0.3);
        assert_eq!(anchors.right_ear.y, 0.41);
        assert_eq!(anchors.chin.y, 0.8);
    }

    #[test]
    fn short_sets_have_no_anchors() {
        let face = LandmarkSet::new(vec![Landmark::default(); 300]);
        assert!(face.anchors().is_none());
    }

    #[test]
    fn mirroring_flips_only_x() {
        let mirrored = Landmark::new(0.25, 0.6, -0.1).mirrored();
        assert_eq!(mirrored, Landmark::new(0.75, 0.6, -0.1));
    }

    #[test]
    fn bounds_ignore_iris_points() {
        let mut points = vec![Landmark::new(0.4, 0.4, 0.0); REFINED_FACE_MESH_POINTS];
        points[10] = Landmark::new(0.2, 0.3, 0.0);
        points[20] = Landmark::new(0.6, 0.7, 0.0);
        points[470] = Landmark::new(0.0, 0.0, 0.0);
        let face = LandmarkSet::new(points);

        let bounds = face.bounds().expect("bounds");
        assert_eq!((bounds.min_x, bounds.min_y), (0.2, 0.3));
        assert_eq!((bounds.max_x, bounds.max_y), (0.6, 0.7));
        assert!(face.is_refined());
    }

    #[test]
    fn truncation_drops_iris_points() {
        let mut face = LandmarkSet::new(vec![Landmark::default(); REFINED_FACE_MESH_POINTS]);
        face.truncate_to_base();
        assert_eq!(face.len(), FACE_MESH_POINTS);
        assert!(!face.is_refined());
    }
}
