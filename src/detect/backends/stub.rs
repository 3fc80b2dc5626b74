use anyhow::Result;

use crate::detect::backend::{ObjectDetector, PoseEstimator};
use crate::detect::result::{Detection, Pose};
use crate::frame::Frame;

/// Stub backend for dry runs. Sees nothing, so every frame is an empty scene.
#[derive(Default)]
pub struct StubBackend {
    calls: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ObjectDetector for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        self.calls += 1;
        Ok(Vec::new())
    }
}

impl PoseEstimator for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn estimate(&mut self, _frame: &Frame) -> Result<Vec<Pose>> {
        self.calls += 1;
        Ok(Vec::new())
    }
}
