use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::detect::backend::{ObjectDetector, PoseEstimator};
use crate::detect::result::{Detection, Keypoint, Pose};
use crate::frame::Frame;

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    frame: u64,
    #[serde(default)]
    detections: Vec<Detection>,
    #[serde(default)]
    poses: Vec<Vec<Keypoint>>,
}

#[derive(Debug, Default)]
struct ReplayScript {
    frames: HashMap<u64, ReplayRecord>,
}

/// Replays recorded perception output keyed by frame index.
///
/// The script is JSON lines, one object per frame:
/// `{"frame": 0, "detections": [{"label": "hardhat", "bbox": [x1, y1, x2, y2],
/// "confidence": 0.9}], "poses": [[[x, y, conf], ...]]}`.
/// Frames missing from the script are empty scenes. Pose landmark counts are
/// validated at estimate time so malformed recordings surface as perception
/// failures.
#[derive(Clone)]
pub struct ReplayBackend {
    script: Arc<ReplayScript>,
    confidence_threshold: f32,
}

impl ReplayBackend {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid replay script {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut script = ReplayScript::default();
        for (line_no, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record: ReplayRecord = serde_json::from_str(line)
                .map_err(|e| anyhow!("line {}: {}", line_no + 1, e))?;
            if script.frames.contains_key(&record.frame) {
                return Err(anyhow!(
                    "line {}: duplicate frame {}",
                    line_no + 1,
                    record.frame
                ));
            }
            script.frames.insert(record.frame, record);
        }
        Ok(Self {
            script: Arc::new(script),
            confidence_threshold: 0.0,
        })
    }

    /// Keep only detections scoring above this confidence, as a live detector would.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.script.frames.len()
    }
}

impl ObjectDetector for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let Some(record) = self.script.frames.get(&frame.index) else {
            return Ok(Vec::new());
        };
        Ok(record
            .detections
            .iter()
            .filter(|d| d.confidence > self.confidence_threshold)
            .cloned()
            .collect())
    }
}

impl PoseEstimator for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Pose>> {
        let Some(record) = self.script.frames.get(&frame.index) else {
            return Ok(Vec::new());
        };
        record
            .poses
            .iter()
            .enumerate()
            .map(|(person, keypoints)| {
                Pose::from_keypoints(keypoints.clone())
                    .with_context(|| format!("frame {} person {}", frame.index, person))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn pose_json(len: usize) -> String {
        let points: Vec<String> = (0..len).map(|i| format!("[{}, 10.0, 0.9]", i)).collect();
        format!("[{}]", points.join(","))
    }

    #[test]
    fn replay_serves_recorded_frames() {
        let script = format!(
            "# recorded\n{{\"frame\": 2, \"detections\": [{{\"label\": \"Hardhat\", \"bbox\": [0,0,5,5], \"confidence\": 0.9}}, {{\"label\": \"boot\", \"bbox\": [0,0,5,5], \"confidence\": 0.2}}], \"poses\": [{}]}}\n",
            pose_json(17)
        );
        let mut backend = ReplayBackend::parse(&script).unwrap().with_threshold(0.5);
        assert_eq!(backend.frame_count(), 1);

        let empty = Frame::new(0, RgbImage::new(4, 4));
        assert!(backend.detect(&empty).unwrap().is_empty());
        assert!(backend.estimate(&empty).unwrap().is_empty());

        let frame = Frame::new(2, RgbImage::new(4, 4));
        let detections = backend.detect(&frame).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "Hardhat");
        assert_eq!(backend.estimate(&frame).unwrap().len(), 1);
    }

    #[test]
    fn detection_at_threshold_is_dropped() {
        let script = "{\"frame\": 0, \"detections\": [{\"label\": \"mask\", \"bbox\": [0,0,5,5], \"confidence\": 0.5}, {\"label\": \"glove\", \"bbox\": [0,0,5,5], \"confidence\": 0.51}]}";
        let mut backend = ReplayBackend::parse(script).unwrap().with_threshold(0.5);
        let detections = backend.detect(&Frame::new(0, RgbImage::new(4, 4))).unwrap();
        let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["glove"]);
    }

    #[test]
    fn malformed_pose_is_an_error() {
        let script = format!("{{\"frame\": 0, \"poses\": [{}]}}", pose_json(5));
        let mut backend = ReplayBackend::parse(&script).unwrap();
        let frame = Frame::new(0, RgbImage::new(4, 4));
        assert!(backend.estimate(&frame).is_err());
    }

    #[test]
    fn duplicate_frames_are_rejected() {
        let script = "{\"frame\": 1}\n{\"frame\": 1}\n";
        assert!(ReplayBackend::parse(script).is_err());
    }
}
