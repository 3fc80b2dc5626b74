use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Number of landmarks in a COCO-style pose.
pub const POSE_LANDMARKS: usize = 17;

/// Axis-aligned box in integer pixel coordinates, `(x1, y1)` top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Positive-area intersection. Boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x2.min(other.x2) > self.x1.max(other.x1)
            && self.y2.min(other.y2) > self.y1.max(other.y1)
    }
}

impl From<[i32; 4]> for BBox {
    fn from(v: [i32; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One object-detector output for a single frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

impl From<[f32; 3]> for Keypoint {
    fn from(v: [f32; 3]) -> Self {
        Keypoint::new(v[0], v[1], v[2])
    }
}

impl From<Keypoint> for [f32; 3] {
    fn from(k: Keypoint) -> Self {
        [k.x, k.y, k.confidence]
    }
}

/// The 17 landmarks of one detected person.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    keypoints: [Keypoint; POSE_LANDMARKS],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; POSE_LANDMARKS]) -> Self {
        Self { keypoints }
    }

    /// Builds a pose from estimator output, rejecting any other landmark count.
    pub fn from_keypoints(keypoints: Vec<Keypoint>) -> Result<Self> {
        let len = keypoints.len();
        let keypoints: [Keypoint; POSE_LANDMARKS] = keypoints.try_into().map_err(|_| {
            anyhow!(
                "pose has {} keypoints, expected {}",
                len,
                POSE_LANDMARKS
            )
        })?;
        Ok(Self { keypoints })
    }

    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    pub fn keypoints(&self) -> &[Keypoint; POSE_LANDMARKS] {
        &self.keypoints
    }
}

/// Combined perception output for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerceptionResult {
    pub detections: Vec<Detection>,
    pub poses: Vec<Pose>,
}

impl PerceptionResult {
    pub fn has_person(&self) -> bool {
        !self.poses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_sharing_boxes_do_not_intersect() {
        let region = BBox::new(0, 0, 10, 10);
        assert!(!region.intersects(&BBox::new(10, 0, 20, 10)));
        assert!(!region.intersects(&BBox::new(0, 10, 10, 20)));
        assert!(region.intersects(&BBox::new(9, 9, 20, 20)));
    }

    #[test]
    fn pose_rejects_wrong_landmark_count() {
        assert!(Pose::from_keypoints(vec![Keypoint::default(); 16]).is_err());
        let pose = Pose::from_keypoints(vec![Keypoint::new(1.0, 2.0, 0.9); 17]).unwrap();
        assert_eq!(pose.keypoint(16).unwrap().y, 2.0);
        assert!(pose.keypoint(17).is_none());
    }

    #[test]
    fn detection_deserializes_from_array_bbox() {
        let det: Detection =
            serde_json::from_str(r#"{"label":"hardhat","bbox":[1,2,3,4],"confidence":0.9}"#)
                .unwrap();
        assert_eq!(det.bbox, BBox::new(1, 2, 3, 4));
        assert_eq!(det.bbox.width(), 2);
    }
}
