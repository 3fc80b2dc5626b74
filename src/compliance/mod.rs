//! Compliance inference: pose-anchored regions, label/overlap matching and the
//! per-frame verdict.

pub mod evaluator;
pub mod overlap;
pub mod roi;

pub use evaluator::{
    AggregationMode, AnatomicalRegion, ComplianceVerdict, Evaluator, PersonVerdict,
};
pub use overlap::{label_matches, overlaps};
pub use roi::{
    RegionKind, RegionShape, RegionSpec, RegionStub, RoiDeriver, DEFAULT_KEYPOINT_CONFIDENCE,
    DEFAULT_REGION_SPECS,
};
