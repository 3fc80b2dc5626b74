//! Per-session plain-text violation journal.
//!
//! One UTF-8 line per violation, opened in append mode for every write so a
//! crash never leaves a buffered entry behind. The summary block is appended
//! once at shutdown.

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::SentinelError;
use crate::ppe::{join_categories, PpeCategory};

pub const ENTRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SUMMARY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Clone, Debug)]
pub struct ViolationJournal {
    path: PathBuf,
}

impl ViolationJournal {
    /// Journal at `<dir>/violations_<YYYYmmdd_HHMMSS>.txt`. Creates `dir`.
    pub fn for_session(dir: &Path, started_at: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let name = format!("violations_{}.txt", started_at.format(FILE_TIME_FORMAT));
        Ok(Self {
            path: dir.join(name),
        })
    }

    /// Journal at an explicit path. The parent directory must exist.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `[ts] VIOLATION #n: Missing a, b` and returns the line written.
    pub fn append_violation(
        &self,
        sequence: u64,
        at: DateTime<Local>,
        missing: &[PpeCategory],
    ) -> Result<String, SentinelError> {
        let line = format_entry(sequence, at, missing);
        self.append(&format!("{}\n", line))?;
        Ok(line)
    }

    pub fn append_summary(
        &self,
        stopped_at: DateTime<Local>,
        total: u64,
    ) -> Result<(), SentinelError> {
        self.append(&format!(
            "\nStopped: {}\nTotal violations: {}\n",
            stopped_at.format(SUMMARY_TIME_FORMAT),
            total
        ))
    }

    fn append(&self, text: &str) -> Result<(), SentinelError> {
        let persist = |source| SentinelError::PersistenceFailure {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(persist)?;
        file.write_all(text.as_bytes()).map_err(persist)?;
        Ok(())
    }
}

pub fn format_entry(sequence: u64, at: DateTime<Local>, missing: &[PpeCategory]) -> String {
    format!(
        "[{}] VIOLATION #{}: Missing {}",
        at.format(ENTRY_TIME_FORMAT),
        sequence,
        join_categories(missing)
    )
}
