//! JPEG encoding

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{DynamicImage, RgbaImage};

use crate::error::CaptureError;

/// Default JPEG quality (1-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Initial output buffer capacity; a typical desktop frame fits in 512KB
const INITIAL_BUFFER: usize = 512 * 1024;

/// Encodes raw RGBA captures into standalone JPEG images
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Create an encoder; quality is clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode one image into a fresh buffer
    ///
    /// JPEG has no alpha channel, so the image is flattened to RGB first.
    pub fn encode(&self, image: RgbaImage) -> Result<Bytes, CaptureError> {
        let rgb = DynamicImage::ImageRgba8(image).into_rgb8();

        let mut out = Vec::with_capacity(INITIAL_BUFFER);
        ImageJpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(&rgb)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        Ok(Bytes::from(out))
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}
