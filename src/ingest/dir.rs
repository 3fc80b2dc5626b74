//! Local image-directory frame source.
//!
//! Replays a folder of still images as a stream, in lexical file-name order.
//! Only local paths are accepted; a decode failure ends the stream with an
//! error rather than skipping the frame.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use super::{FrameSource, SourceConfig};
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub struct ImageDirSource {
    root: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    max_frames: Option<u64>,
}

impl ImageDirSource {
    pub fn open(config: SourceConfig) -> Result<Self> {
        let root = PathBuf::from(&config.uri);
        let files = list_images(&root)?;
        if files.is_empty() {
            return Err(anyhow!("no images found in {}", root.display()));
        }
        log::info!(
            "ImageDirSource: {} images in {}",
            files.len(),
            root.display()
        );
        Ok(Self {
            root,
            files,
            cursor: 0,
            max_frames: config.max_frames,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self
            .max_frames
            .is_some_and(|max| self.cursor as u64 >= max)
        {
            return Ok(None);
        }
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let image = image::open(path)
            .with_context(|| format!("failed to decode frame {}", path.display()))?
            .into_rgb8();
        let frame = Frame::new(self.cursor as u64, image);
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn frames_captured(&self) -> u64 {
        self.cursor as u64
    }
}

fn list_images(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("failed to read image directory {}", root.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
