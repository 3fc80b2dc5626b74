use anyhow::Result;

use crate::detect::result::{Detection, PerceptionResult, Pose};
use crate::frame::Frame;

/// Object detector backend.
///
/// Implementations return every detection they consider confident enough;
/// class labels are matched against the PPE vocabulary downstream.
pub trait ObjectDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Human pose estimator backend. One `Pose` per detected person.
pub trait PoseEstimator: Send {
    fn name(&self) -> &'static str;

    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Pose>>;

    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Both perception models behind one call.
pub struct Perception {
    detector: Box<dyn ObjectDetector>,
    estimator: Box<dyn PoseEstimator>,
}

impl Perception {
    pub fn new(detector: Box<dyn ObjectDetector>, estimator: Box<dyn PoseEstimator>) -> Self {
        Self {
            detector,
            estimator,
        }
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.detector.warm_up()?;
        self.estimator.warm_up()
    }

    /// Runs both models. Any failure fails the whole frame so a detector
    /// outage cannot leave poses without their matching detections.
    pub fn perceive(&mut self, frame: &Frame) -> Result<PerceptionResult> {
        let detections = self.detector.detect(frame)?;
        let poses = self.estimator.estimate(frame)?;
        Ok(PerceptionResult { detections, poses })
    }

    pub fn describe(&self) -> String {
        format!("{}+{}", self.detector.name(), self.estimator.name())
    }
}
