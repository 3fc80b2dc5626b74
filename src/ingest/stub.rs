use anyhow::Result;
use image::{Rgb, RgbImage};
use std::time::Instant;

use super::{FrameSource, SourceConfig};
use crate::frame::Frame;

/// Synthetic camera for `stub://` URIs.
///
/// Produces a slowly shifting gradient, paced to `target_fps` the way a real
/// camera blocks between frames.
pub struct SyntheticSource {
    config: SourceConfig,
    frame_count: u64,
    scene_state: u8,
    last_frame_at: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        log::info!("SyntheticSource: connected to {} (synthetic)", config.uri);
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
            last_frame_at: None,
        }
    }

    fn pace(&mut self) {
        if let (Some(interval), Some(last)) = (self.config.frame_interval(), self.last_frame_at) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_frame_at = Some(Instant::now());
    }

    fn generate_synthetic_image(&mut self) -> RgbImage {
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let shift = (self.frame_count + self.scene_state as u64) as u32;
        RgbImage::from_fn(self.config.width, self.config.height, |x, y| {
            Rgb([
                ((x + shift) % 256) as u8,
                ((y + shift) % 256) as u8,
                self.scene_state.wrapping_mul(40),
            ])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        self.config.uri.clone()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self
            .config
            .max_frames
            .is_some_and(|max| self.frame_count >= max)
        {
            return Ok(None);
        }
        self.pace();
        let image = self.generate_synthetic_image();
        let frame = Frame::new(self.frame_count, image);
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn frames_captured(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config() -> SourceConfig {
        SourceConfig {
            uri: "stub://test".to_string(),
            width: 64,
            height: 48,
            target_fps: 0,
            max_frames: Some(3),
        }
    }

    #[test]
    fn synthetic_source_numbers_frames_from_zero() -> Result<()> {
        let mut source = SyntheticSource::new(stub_config());
        let indices: Vec<u64> = std::iter::from_fn(|| source.next_frame().ok().flatten())
            .map(|f| f.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn synthetic_frames_have_configured_size() -> Result<()> {
        let mut source = SyntheticSource::new(stub_config());
        let frame = source.next_frame()?.expect("frame");
        assert_eq!((frame.width(), frame.height()), (64, 48));
        Ok(())
    }

    #[test]
    fn synthetic_frames_change_over_time() -> Result<()> {
        let mut source = SyntheticSource::new(stub_config());
        let a = source.next_frame()?.expect("frame");
        let b = source.next_frame()?.expect("frame");
        assert_ne!(a.image, b.image);
        Ok(())
    }
}
