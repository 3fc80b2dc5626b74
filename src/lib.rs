//! PPE Sentinel
//!
//! Checks whether people in a camera feed are wearing their required
//! protective equipment and keeps a debounced journal of violations.
//!
//! # Pipeline
//!
//! 1. A `FrameSource` yields frames (synthetic `stub://` or an image directory).
//! 2. `Perception` runs an object detector and a pose estimator on every
//!    `stride`-th frame; frames in between reuse the cached result.
//! 3. The `Evaluator` derives head/hand/foot regions from pose landmarks and
//!    checks each required item against overlapping detections.
//! 4. The `Session` debounces non-compliant verdicts and, per violation event,
//!    appends a journal line and writes an annotated snapshot.
//!
//! # Module Structure
//!
//! - `ppe`: categories, label vocabulary, demo overrides
//! - `detect`: perception result types and backends (stub, replay)
//! - `compliance`: region derivation, overlap matching, verdicts
//! - `debounce`, `journal`, `snapshot`, `session`: violation handling
//! - `annotate`: region overlay
//! - `ingest`, `monitor`: frame sources and the frame loop
//! - `config`: file + environment configuration

pub mod annotate;
pub mod compliance;
pub mod config;
pub mod debounce;
pub mod detect;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod journal;
pub mod monitor;
pub mod ppe;
pub mod session;
pub mod snapshot;

pub use compliance::{
    AggregationMode, AnatomicalRegion, ComplianceVerdict, Evaluator, PersonVerdict, RegionKind,
    RoiDeriver,
};
pub use config::MonitorConfig;
pub use debounce::{DebounceState, ViolationDebouncer};
pub use detect::{
    BBox, Detection, Keypoint, ObjectDetector, Perception, PerceptionResult, Pose, PoseEstimator,
    ReplayBackend, StubBackend,
};
pub use error::SentinelError;
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SourceConfig};
pub use journal::ViolationJournal;
pub use monitor::{FrameReport, Monitor, MonitorStats, PerceptionCache};
pub use ppe::{DemoOverrides, LabelVocabulary, PpeCategory};
pub use session::{Session, ViolationEvent};
pub use snapshot::SnapshotStore;
