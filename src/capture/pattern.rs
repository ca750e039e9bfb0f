//! Synthetic test pattern
//!
//! Stands in for a real display when the `screen` feature is off, or when
//! exercising the pipeline headless.

use image::{Rgba, RgbaImage};

use super::source::ScreenGrabber;
use crate::error::CaptureError;

/// Moving diagonal gradient with a sweeping bar
#[derive(Debug, Clone)]
pub struct TestPattern {
    width: u32,
    height: u32,
    tick: u32,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&self) -> RgbaImage {
        let shift = self.tick.wrapping_mul(4);
        let bar = if self.width > 0 {
            self.tick.wrapping_mul(8) % self.width
        } else {
            0
        };

        RgbaImage::from_fn(self.width, self.height, |x, y| {
            if x.abs_diff(bar) < 4 {
                return Rgba([255, 255, 255, 255]);
            }
            let r = (x.wrapping_add(shift) % 256) as u8;
            let g = (y.wrapping_add(shift / 2) % 256) as u8;
            let b = ((x + y) / 2 % 256) as u8;
            Rgba([r, g, b, 255])
        })
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new(640, 360)
    }
}

impl ScreenGrabber for TestPattern {
    fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::Grab("empty test pattern".into()));
        }
        let image = self.render();
        self.tick = self.tick.wrapping_add(1);
        Ok(image)
    }
}
