use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::compliance::overlap::overlaps;
use crate::compliance::roi::{RegionKind, RoiDeriver};
use crate::detect::{BBox, Detection, Pose};
use crate::ppe::{DemoOverrides, LabelVocabulary, PpeCategory};

/// How satisfaction is pooled when several people are in frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// A category is present if any region in the frame satisfies it.
    /// One equipped bystander can cover for an unequipped worker.
    #[default]
    Frame,
    /// Each person is judged on their own regions; the frame misses the union.
    PerPerson,
}

impl FromStr for AggregationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "frame" => Ok(AggregationMode::Frame),
            "per_person" => Ok(AggregationMode::PerPerson),
            other => Err(anyhow!(
                "unknown aggregation mode '{}' (expected frame or per_person)",
                other
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnatomicalRegion {
    /// Index of the pose this region came from.
    pub person: usize,
    pub kind: RegionKind,
    pub bbox: BBox,
    pub satisfied: BTreeMap<PpeCategory, bool>,
}

impl AnatomicalRegion {
    pub fn satisfies(&self, category: PpeCategory) -> bool {
        self.satisfied.get(&category).copied().unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonVerdict {
    pub person: usize,
    pub missing_items: Vec<PpeCategory>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComplianceVerdict {
    pub is_compliant: bool,
    /// Subset of the required list, in its order.
    pub missing_items: Vec<PpeCategory>,
    pub regions: Vec<AnatomicalRegion>,
    pub persons: Vec<PersonVerdict>,
}

impl ComplianceVerdict {
    /// Verdict for a frame with nobody in it.
    pub fn skipped() -> Self {
        Self {
            is_compliant: true,
            missing_items: Vec::new(),
            regions: Vec::new(),
            persons: Vec::new(),
        }
    }

    pub fn was_evaluated(&self) -> bool {
        !self.persons.is_empty()
    }
}

/// Fuses detections and poses into a per-frame PPE verdict. Holds no
/// cross-frame state.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    roi: RoiDeriver,
    vocabulary: LabelVocabulary,
    aggregation: AggregationMode,
}

impl Evaluator {
    pub fn new(roi: RoiDeriver, vocabulary: LabelVocabulary, aggregation: AggregationMode) -> Self {
        Self {
            roi,
            vocabulary,
            aggregation,
        }
    }

    pub fn aggregation(&self) -> AggregationMode {
        self.aggregation
    }

    pub fn evaluate(
        &self,
        detections: &[Detection],
        poses: &[Pose],
        required: &[PpeCategory],
        overrides: &DemoOverrides,
    ) -> ComplianceVerdict {
        if poses.is_empty() {
            return ComplianceVerdict::skipped();
        }

        let mut regions = Vec::new();
        let mut persons = Vec::with_capacity(poses.len());
        let mut frame_detected = BTreeSet::new();

        for (person, pose) in poses.iter().enumerate() {
            let mut detected = BTreeSet::new();
            for stub in self.roi.derive(pose) {
                let satisfied: BTreeMap<PpeCategory, bool> = stub
                    .kind
                    .categories()
                    .iter()
                    .map(|&category| {
                        let hit = overrides.is_forced(category)
                            || overlaps(&stub.bbox, detections, self.vocabulary.keywords(category));
                        (category, hit)
                    })
                    .collect();
                detected.extend(
                    satisfied
                        .iter()
                        .filter(|(_, hit)| **hit)
                        .map(|(category, _)| *category),
                );
                regions.push(AnatomicalRegion {
                    person,
                    kind: stub.kind,
                    bbox: stub.bbox,
                    satisfied,
                });
            }
            persons.push(PersonVerdict {
                person,
                missing_items: missing(required, &detected, overrides),
            });
            frame_detected.extend(detected);
        }

        let missing_items = match self.aggregation {
            AggregationMode::Frame => missing(required, &frame_detected, overrides),
            AggregationMode::PerPerson => required
                .iter()
                .copied()
                .filter(|c| persons.iter().any(|p| p.missing_items.contains(c)))
                .collect(),
        };

        ComplianceVerdict {
            is_compliant: missing_items.is_empty(),
            missing_items,
            regions,
            persons,
        }
    }
}

fn missing(
    required: &[PpeCategory],
    detected: &BTreeSet<PpeCategory>,
    overrides: &DemoOverrides,
) -> Vec<PpeCategory> {
    required
        .iter()
        .copied()
        .filter(|c| !detected.contains(c) && !overrides.is_forced(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Keypoint, POSE_LANDMARKS};

    const ALL: [PpeCategory; 4] = PpeCategory::ALL;

    fn head_pose(cx: f32) -> Pose {
        let mut kps = [Keypoint::default(); POSE_LANDMARKS];
        kps[0] = Keypoint::new(cx, 100.0, 0.9);
        kps[1] = Keypoint::new(cx - 10.0, 95.0, 0.9);
        kps[2] = Keypoint::new(cx + 10.0, 95.0, 0.9);
        Pose::new(kps)
    }

    fn full_pose(cx: f32) -> Pose {
        let mut kps = *head_pose(cx).keypoints();
        kps[9] = Keypoint::new(cx - 60.0, 250.0, 0.9);
        kps[10] = Keypoint::new(cx + 60.0, 250.0, 0.9);
        kps[15] = Keypoint::new(cx - 20.0, 450.0, 0.9);
        kps[16] = Keypoint::new(cx + 20.0, 450.0, 0.9);
        Pose::new(kps)
    }

    fn equipment_for(cx: i32) -> Vec<Detection> {
        vec![
            Detection::new("helmet", BBox::new(cx - 15, 70, cx + 15, 95), 0.9),
            Detection::new("mask", BBox::new(cx - 8, 98, cx + 8, 110), 0.8),
            Detection::new("gloves", BBox::new(cx - 70, 240, cx + 70, 260), 0.8),
            Detection::new("safety_boot", BBox::new(cx - 30, 440, cx + 30, 460), 0.8),
        ]
    }

    #[test]
    fn no_people_skips_evaluation() {
        let verdict = Evaluator::default().evaluate(&[], &[], &ALL, &DemoOverrides::new());
        assert!(verdict.is_compliant);
        assert!(!verdict.was_evaluated());
        assert!(verdict.missing_items.is_empty());
    }

    #[test]
    fn fully_equipped_person_is_compliant() {
        let verdict = Evaluator::default().evaluate(
            &equipment_for(300),
            &[full_pose(300.0)],
            &ALL,
            &DemoOverrides::new(),
        );
        assert!(verdict.is_compliant, "missing {:?}", verdict.missing_items);
        assert_eq!(verdict.regions.len(), 5);
        assert!(verdict.regions.iter().all(|r| r.satisfied.values().all(|s| *s)));
    }

    #[test]
    fn missing_items_follow_required_order() {
        let required = [PpeCategory::Shoes, PpeCategory::Helmet];
        let verdict = Evaluator::default().evaluate(
            &[],
            &[head_pose(300.0)],
            &required,
            &DemoOverrides::new(),
        );
        assert_eq!(verdict.missing_items, vec![PpeCategory::Shoes, PpeCategory::Helmet]);
        assert!(!verdict.is_compliant);
    }

    #[test]
    fn override_marks_regions_satisfied() {
        let mut overrides = DemoOverrides::new();
        overrides.set(PpeCategory::Helmet, true);
        let verdict = Evaluator::default().evaluate(&[], &[head_pose(300.0)], &ALL, &overrides);
        let head = &verdict.regions[0];
        assert!(head.satisfies(PpeCategory::Helmet));
        assert!(!head.satisfies(PpeCategory::Mask));
        assert!(!verdict.missing_items.contains(&PpeCategory::Helmet));
    }

    #[test]
    fn frame_mode_lets_bystander_cover_worker() {
        let poses = [full_pose(300.0), full_pose(700.0)];
        let detections = equipment_for(300);
        let frame = Evaluator::default().evaluate(&detections, &poses, &ALL, &DemoOverrides::new());
        assert!(frame.is_compliant);
        assert_eq!(frame.persons[1].missing_items, ALL.to_vec());

        let strict = Evaluator::new(
            RoiDeriver::default(),
            LabelVocabulary::default(),
            AggregationMode::PerPerson,
        );
        let verdict = strict.evaluate(&detections, &poses, &ALL, &DemoOverrides::new());
        assert!(!verdict.is_compliant);
        assert_eq!(verdict.missing_items, ALL.to_vec());
        assert!(verdict.persons[0].missing_items.is_empty());
    }

    #[test]
    fn aggregation_mode_parses() {
        assert_eq!("per-person".parse::<AggregationMode>().unwrap(), AggregationMode::PerPerson);
        assert_eq!("Frame".parse::<AggregationMode>().unwrap(), AggregationMode::Frame);
        assert!("crowd".parse::<AggregationMode>().is_err());
    }
}
