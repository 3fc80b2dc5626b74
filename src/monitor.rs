//! Frame loop: perception on every `stride`-th frame, compliance on every
//! frame, debounced violations through the session.

use chrono::Local;
use image::RgbImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::annotate;
use crate::compliance::{ComplianceVerdict, Evaluator, RoiDeriver};
use crate::config::MonitorConfig;
use crate::detect::{Perception, PerceptionResult};
use crate::error::SentinelError;
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::session::{Session, ViolationEvent};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Holds the last perception result so frames between inference runs are
/// evaluated against it.
#[derive(Debug)]
pub struct PerceptionCache {
    stride: u64,
    cached: Option<PerceptionResult>,
}

impl PerceptionCache {
    pub fn new(stride: u32) -> Self {
        Self {
            stride: u64::from(stride.max(1)),
            cached: None,
        }
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn needs_refresh(&self, frame_index: u64) -> bool {
        self.cached.is_none() || frame_index % self.stride == 0
    }

    pub fn store(&mut self, result: PerceptionResult) -> &PerceptionResult {
        self.cached.insert(result)
    }

    pub fn current(&self) -> Option<&PerceptionResult> {
        self.cached.as_ref()
    }
}

/// Outcome of one processed frame.
#[derive(Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    /// True when perception ran on this frame (successfully or not).
    pub refreshed: bool,
    pub perception_failed: bool,
    pub verdict: ComplianceVerdict,
    pub annotated: RgbImage,
    pub event: Option<ViolationEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames: u64,
    pub inference_runs: u64,
    pub perception_failures: u64,
    pub violations: u64,
}

pub struct Monitor {
    evaluator: Evaluator,
    cache: PerceptionCache,
}

impl Monitor {
    pub fn new(evaluator: Evaluator, stride: u32) -> Self {
        Self {
            evaluator,
            cache: PerceptionCache::new(stride),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        let evaluator = Evaluator::new(
            RoiDeriver::new(config.inference.keypoint_confidence),
            config.vocabulary.clone(),
            config.aggregation,
        );
        Self::new(evaluator, config.inference.stride)
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluates one frame.
    ///
    /// A perception failure is logged and replaced by an empty result, which
    /// evaluates as "no person" and therefore never opens a violation.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        perception: &mut Perception,
        session: &mut Session,
    ) -> FrameReport {
        let refreshed = self.cache.needs_refresh(frame.index);
        let mut perception_failed = false;
        if refreshed {
            log::debug!("frame {}: running perception", frame.index);
            let result = match perception.perceive(frame) {
                Ok(result) => result,
                Err(e) => {
                    let err = SentinelError::PerceptionFailure(e);
                    log::warn!("frame {}: {}", frame.index, err);
                    perception_failed = true;
                    PerceptionResult::default()
                }
            };
            self.cache.store(result);
        }

        let verdict = match self.cache.current() {
            Some(result) => self.evaluator.evaluate(
                &result.detections,
                &result.poses,
                session.required_ppe(),
                session.overrides(),
            ),
            None => ComplianceVerdict::skipped(),
        };

        let mut annotated = frame.image.clone();
        annotate::render(
            &mut annotated,
            &annotate::annotations(&verdict, session.required_ppe()),
        );

        let event =
            session.process_frame_result_at(&verdict, &annotated, frame.captured_at, Local::now());

        FrameReport {
            frame_index: frame.index,
            refreshed,
            perception_failed,
            verdict,
            annotated,
            event,
        }
    }

    /// Runs until the source ends or `stop` is set, then writes the session
    /// summary. A source failure also writes the summary before returning.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        perception: &mut Perception,
        session: &mut Session,
        stop: &AtomicBool,
    ) -> Result<MonitorStats, SentinelError> {
        let mut stats = MonitorStats::default();
        let mut last_health_log = Instant::now();

        log::info!(
            "monitor running: source={} perception={} stride={} aggregation={:?}",
            source.describe(),
            perception.describe(),
            self.cache.stride(),
            self.evaluator.aggregation()
        );

        let outcome = loop {
            if stop.load(Ordering::SeqCst) {
                log::info!("stop requested");
                break Ok(());
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("source {} ended", source.describe());
                    break Ok(());
                }
                Err(e) => break Err(SentinelError::InputUnavailable(e)),
            };

            let report = self.process_frame(&frame, perception, session);
            stats.frames += 1;
            if report.refreshed {
                stats.inference_runs += 1;
            }
            if report.perception_failed {
                stats.perception_failures += 1;
            }
            if report.event.is_some() {
                stats.violations += 1;
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                log::info!(
                    "frames={} inference_runs={} violations={} state={:?}",
                    stats.frames,
                    stats.inference_runs,
                    stats.violations,
                    session.debounce_state(Instant::now())
                );
                last_health_log = Instant::now();
            }
        };

        if let Err(e) = &outcome {
            log::error!("{}", e);
        }
        if let Err(e) = session.finish(Local::now()) {
            log::warn!("{}", e);
        }
        outcome.map(|()| stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BBox, Detection, Keypoint, Pose, POSE_LANDMARKS};

    #[test]
    fn cache_refreshes_on_stride_boundaries() {
        let mut cache = PerceptionCache::new(3);
        assert!(cache.needs_refresh(1), "empty cache always refreshes");
        cache.store(PerceptionResult::default());
        let refreshed: Vec<u64> = (0..7).filter(|i| cache.needs_refresh(*i)).collect();
        assert_eq!(refreshed, vec![0, 3, 6]);
    }

    #[test]
    fn zero_stride_behaves_like_one() {
        let mut cache = PerceptionCache::new(0);
        cache.store(PerceptionResult::default());
        assert!((0..4).all(|i| cache.needs_refresh(i)));
    }

    #[test]
    fn store_replaces_previous_result() {
        let mut cache = PerceptionCache::new(2);
        cache.store(PerceptionResult {
            detections: vec![Detection::new("helmet", BBox::new(0, 0, 10, 10), 0.9)],
            poses: vec![Pose::new([Keypoint::default(); POSE_LANDMARKS])],
        });
        cache.store(PerceptionResult::default());
        assert!(!cache.current().unwrap().has_person());
    }
}
