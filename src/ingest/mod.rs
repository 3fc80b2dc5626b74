//! Frame ingestion sources.
//!
//! - `stub://<name>`: synthetic gradient frames (testing, dry runs)
//! - a local directory of `.jpg` / `.jpeg` / `.png` images, read in lexical order
//!
//! Sources number frames from zero; the monitor's perception stride relies on
//! that numbering. `Ok(None)` marks the end of a finite stream.

pub mod dir;
pub mod stub;

use anyhow::{anyhow, Result};
use std::time::Duration;

use crate::frame::Frame;

pub use dir::ImageDirSource;
pub use stub::SyntheticSource;

pub trait FrameSource {
    /// Human-readable source identifier for logs.
    fn describe(&self) -> String;

    /// Capture the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Number of frames produced so far.
    fn frames_captured(&self) -> u64;
}

/// Configuration for opening a frame source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// `stub://<name>` or a local directory path.
    pub uri: String,
    /// Frame width for synthetic frames.
    pub width: u32,
    /// Frame height for synthetic frames.
    pub height: u32,
    /// Pacing for synthetic frames. Zero disables pacing.
    pub target_fps: u32,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            uri: "stub://camera".to_string(),
            width: 640,
            height: 480,
            target_fps: 10,
            max_frames: None,
        }
    }
}

impl SourceConfig {
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / self.target_fps as f64))
    }
}

/// Opens the source described by `config.uri`.
pub fn open_source(config: SourceConfig) -> Result<Box<dyn FrameSource>> {
    if config.uri.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(config)));
    }
    if config.uri.contains("://") {
        return Err(anyhow!(
            "unsupported source '{}' (expected stub://<name> or a local image directory)",
            config.uri
        ));
    }
    Ok(Box::new(ImageDirSource::open(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_network_uris() {
        let config = SourceConfig {
            uri: "rtsp://192.168.1.10/stream".to_string(),
            ..SourceConfig::default()
        };
        assert!(open_source(config).is_err());
    }

    #[test]
    fn opens_stub_source() {
        let config = SourceConfig {
            target_fps: 0,
            max_frames: Some(1),
            ..SourceConfig::default()
        };
        let mut source = open_source(config).unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.frames_captured(), 1);
    }
}
