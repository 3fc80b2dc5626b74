mod backend;
mod backends;
mod result;

pub use backend::{ObjectDetector, Perception, PoseEstimator};
pub use backends::{ReplayBackend, StubBackend};
pub use result::{BBox, Detection, Keypoint, PerceptionResult, Pose, POSE_LANDMARKS};
