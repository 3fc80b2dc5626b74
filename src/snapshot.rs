//! Evidentiary snapshots, one JPEG per violation event.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SentinelError;

/// Millisecond granularity keeps files from colliding across events.
const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create snapshot directory {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, at: DateTime<Local>) -> PathBuf {
        self.root
            .join(format!("violation_{}.jpg", at.format(FILE_TIME_FORMAT)))
    }

    pub fn save(&self, image: &RgbImage, at: DateTime<Local>) -> Result<PathBuf, SentinelError> {
        let path = self.path_for(at);
        image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|source| SentinelError::SnapshotFailure {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
