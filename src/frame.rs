//! Captured frames.
//!
//! A `Frame` is owned by the monitor loop for exactly one iteration. Perception
//! backends borrow it; the annotator works on a copy of its image so the
//! original pixels stay untouched for the next stride.

use image::RgbImage;
use std::time::Instant;

pub struct Frame {
    /// Zero-based position in the stream. Drives the perception stride.
    pub index: u64,
    pub image: RgbImage,
    /// Monotonic capture instant, used for cooldown arithmetic.
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self {
            index,
            image,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_reports_dimensions() {
        let frame = Frame::new(7, RgbImage::new(64, 48));
        assert_eq!(frame.index, 7);
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
    }
}
