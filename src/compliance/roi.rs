//! Anatomical regions of interest derived from pose landmarks.
//!
//! Every body part goes through the same extraction: gate the landmark group
//! on confidence, then shape the surviving landmarks into boxes. The head uses
//! a padded envelope over its landmarks because helmets and masks extend well
//! past the sparse face points; hands and feet use fixed squares per landmark.

use serde::Serialize;

use crate::detect::{BBox, Pose};
use crate::ppe::PpeCategory;

pub const HEAD_LANDMARKS: &[usize] = &[0, 1, 2, 3, 4];
pub const WRIST_LANDMARKS: &[usize] = &[9, 10];
pub const ANKLE_LANDMARKS: &[usize] = &[15, 16];

pub const DEFAULT_KEYPOINT_CONFIDENCE: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Head,
    Hand,
    Foot,
}

impl RegionKind {
    /// Categories a region of this kind can satisfy.
    pub fn categories(self) -> &'static [PpeCategory] {
        match self {
            RegionKind::Head => &[PpeCategory::Helmet, PpeCategory::Mask],
            RegionKind::Hand => &[PpeCategory::Gloves],
            RegionKind::Foot => &[PpeCategory::Shoes],
        }
    }
}

impl PpeCategory {
    pub fn region_kind(self) -> RegionKind {
        match self {
            PpeCategory::Helmet | PpeCategory::Mask => RegionKind::Head,
            PpeCategory::Gloves => RegionKind::Hand,
            PpeCategory::Shoes => RegionKind::Foot,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RegionShape {
    /// One box enclosing all confident landmarks. `pad = trunc(width * pad)`
    /// is added left and right, `pad * top` above and `pad * bottom` below.
    PaddedEnvelope { pad: f32, top: f32, bottom: f32 },
    /// One `size`x`size` box centred on each confident landmark.
    Square { size: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionSpec {
    pub kind: RegionKind,
    pub landmarks: &'static [usize],
    pub shape: RegionShape,
}

pub const DEFAULT_REGION_SPECS: [RegionSpec; 3] = [
    RegionSpec {
        kind: RegionKind::Head,
        landmarks: HEAD_LANDMARKS,
        shape: RegionShape::PaddedEnvelope {
            pad: 0.5,
            top: 1.0,
            bottom: 1.5,
        },
    },
    RegionSpec {
        kind: RegionKind::Hand,
        landmarks: WRIST_LANDMARKS,
        shape: RegionShape::Square { size: 80 },
    },
    RegionSpec {
        kind: RegionKind::Foot,
        landmarks: ANKLE_LANDMARKS,
        shape: RegionShape::Square { size: 80 },
    },
];

/// A region before PPE satisfaction is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionStub {
    pub kind: RegionKind,
    pub bbox: BBox,
}

#[derive(Clone, Debug)]
pub struct RoiDeriver {
    specs: Vec<RegionSpec>,
    confidence_threshold: f32,
}

impl RoiDeriver {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            specs: DEFAULT_REGION_SPECS.to_vec(),
            confidence_threshold,
        }
    }

    pub fn with_specs(mut self, specs: Vec<RegionSpec>) -> Self {
        self.specs = specs;
        self
    }

    /// Regions for one person, in `specs` order (head, hands, feet by default).
    pub fn derive(&self, pose: &Pose) -> Vec<RegionStub> {
        let mut out = Vec::new();
        for spec in &self.specs {
            extract_region(spec, pose, self.confidence_threshold, &mut out);
        }
        out
    }
}

impl Default for RoiDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_KEYPOINT_CONFIDENCE)
    }
}

fn extract_region(spec: &RegionSpec, pose: &Pose, threshold: f32, out: &mut Vec<RegionStub>) {
    let confident = spec
        .landmarks
        .iter()
        .filter_map(|&idx| pose.keypoint(idx))
        .filter(|kp| kp.confidence > threshold);

    match spec.shape {
        RegionShape::PaddedEnvelope { pad, top, bottom } => {
            let mut bounds: Option<(f32, f32, f32, f32)> = None;
            for kp in confident {
                bounds = Some(match bounds {
                    None => (kp.x, kp.y, kp.x, kp.y),
                    Some((x0, y0, x1, y1)) => {
                        (x0.min(kp.x), y0.min(kp.y), x1.max(kp.x), y1.max(kp.y))
                    }
                });
            }
            let Some((x_min, y_min, x_max, y_max)) = bounds else {
                return;
            };
            let pad = ((x_max - x_min) * pad).trunc();
            out.push(RegionStub {
                kind: spec.kind,
                bbox: BBox::new(
                    (x_min - pad) as i32,
                    (y_min - pad * top) as i32,
                    (x_max + pad) as i32,
                    (y_max + pad * bottom) as i32,
                ),
            });
        }
        RegionShape::Square { size } => {
            let half = size as f32 / 2.0;
            for kp in confident {
                out.push(RegionStub {
                    kind: spec.kind,
                    bbox: BBox::new(
                        (kp.x - half) as i32,
                        (kp.y - half) as i32,
                        (kp.x + half) as i32,
                        (kp.y + half) as i32,
                    ),
                });
            }
        }
    }
}
