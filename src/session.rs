//! Monitoring session: required PPE, operator overrides, the debouncer and
//! the violation recorders, owned by the frame thread for the process lifetime.

use anyhow::Result;
use chrono::{DateTime, Local};
use image::RgbImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::compliance::ComplianceVerdict;
use crate::config::MonitorConfig;
use crate::debounce::{DebounceState, ViolationDebouncer};
use crate::error::SentinelError;
use crate::journal::ViolationJournal;
use crate::ppe::{join_categories, DemoOverrides, PpeCategory};
use crate::snapshot::SnapshotStore;

#[derive(Clone, Debug, PartialEq)]
pub struct ViolationEvent {
    pub sequence: u64,
    pub timestamp: DateTime<Local>,
    pub missing_items: Vec<PpeCategory>,
    /// `None` when the snapshot could not be written.
    pub snapshot_path: Option<PathBuf>,
}

pub struct Session {
    required: Vec<PpeCategory>,
    overrides: DemoOverrides,
    debouncer: ViolationDebouncer,
    journal: ViolationJournal,
    snapshots: SnapshotStore,
    started_at: DateTime<Local>,
    persistence_failures: u64,
}

impl Session {
    /// Opens a session from config, creating the log and snapshot directories.
    pub fn start(config: &MonitorConfig) -> Result<Self> {
        let started_at = Local::now();
        let journal = ViolationJournal::for_session(&config.output.log_dir, started_at)?;
        let snapshots = SnapshotStore::new(&config.output.snapshot_dir)?;
        let mut session = Self::new(
            config.required_ppe.clone(),
            config.cooldown,
            journal,
            snapshots,
        );
        session.started_at = started_at;
        session.overrides = config.overrides.clone();
        log::info!(
            "monitoring for: {}",
            join_categories(&session.required)
        );
        log::info!("logging violations to {}", session.journal.path().display());
        log::info!("saving snapshots to {}", session.snapshots.root().display());
        Ok(session)
    }

    pub fn new(
        required: Vec<PpeCategory>,
        cooldown: Duration,
        journal: ViolationJournal,
        snapshots: SnapshotStore,
    ) -> Self {
        Self {
            required,
            overrides: DemoOverrides::new(),
            debouncer: ViolationDebouncer::new(cooldown),
            journal,
            snapshots,
            started_at: Local::now(),
            persistence_failures: 0,
        }
    }

    pub fn required_ppe(&self) -> &[PpeCategory] {
        &self.required
    }

    pub fn overrides(&self) -> &DemoOverrides {
        &self.overrides
    }

    pub fn set_override(&mut self, category: PpeCategory, forced: bool) {
        self.overrides.set(category, forced);
        log::info!("demo override {}: {}", category, forced);
    }

    pub fn toggle_override(&mut self, category: PpeCategory) -> bool {
        let forced = self.overrides.toggle(category);
        log::info!("demo override {}: {}", category, forced);
        forced
    }

    pub fn violation_count(&self) -> u64 {
        self.debouncer.violation_count()
    }

    pub fn persistence_failures(&self) -> u64 {
        self.persistence_failures
    }

    pub fn debounce_state(&self, now: Instant) -> DebounceState {
        self.debouncer.state_at(now)
    }

    pub fn journal_path(&self) -> &std::path::Path {
        self.journal.path()
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Feeds one verdict at the current time. `annotated` is the frame that
    /// becomes the snapshot if this opens a violation event.
    pub fn process_frame_result(
        &mut self,
        verdict: &ComplianceVerdict,
        annotated: &RgbImage,
    ) -> Option<ViolationEvent> {
        self.process_frame_result_at(verdict, annotated, Instant::now(), Local::now())
    }

    /// As `process_frame_result` with explicit monotonic and wall clocks.
    ///
    /// Journal and snapshot failures are logged and counted; the sequence
    /// number is consumed either way.
    pub fn process_frame_result_at(
        &mut self,
        verdict: &ComplianceVerdict,
        annotated: &RgbImage,
        now: Instant,
        wall: DateTime<Local>,
    ) -> Option<ViolationEvent> {
        let sequence = self.debouncer.observe(verdict, now)?;

        match self
            .journal
            .append_violation(sequence, wall, &verdict.missing_items)
        {
            Ok(line) => log::warn!("{}", line),
            Err(e) => self.report_persistence(&e),
        }

        let snapshot_path = match self.snapshots.save(annotated, wall) {
            Ok(path) => {
                log::info!("snapshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                self.report_persistence(&e);
                None
            }
        };

        Some(ViolationEvent {
            sequence,
            timestamp: wall,
            missing_items: verdict.missing_items.clone(),
            snapshot_path,
        })
    }

    /// Appends the shutdown summary to the journal.
    pub fn finish(&mut self, stopped_at: DateTime<Local>) -> Result<(), SentinelError> {
        let total = self.violation_count();
        log::info!("session complete, violations: {}", total);
        let result = self.journal.append_summary(stopped_at, total);
        if result.is_err() {
            self.persistence_failures += 1;
        }
        result
    }

    fn report_persistence(&mut self, err: &SentinelError) {
        self.persistence_failures += 1;
        log::warn!("{}", err);
    }
}
