//! Primary-monitor capture via xcap

use image::RgbaImage;
use xcap::Monitor;

use super::source::ScreenGrabber;
use crate::error::CaptureError;

/// Grabs the primary monitor
pub struct PrimaryMonitor {
    monitor: Monitor,
}

impl PrimaryMonitor {
    /// Locate the primary monitor, falling back to the first one listed
    pub fn open() -> Result<Self, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        let index = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
        let monitor = monitors
            .into_iter()
            .nth(index)
            .ok_or_else(|| CaptureError::Unavailable("no monitors found".into()))?;

        tracing::info!(
            name = %monitor.name(),
            width = monitor.width(),
            height = monitor.height(),
            "Opened primary monitor"
        );

        Ok(Self { monitor })
    }
}

impl ScreenGrabber for PrimaryMonitor {
    fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
        let captured = self
            .monitor
            .capture_image()
            .map_err(|e| CaptureError::Grab(e.to_string()))?;

        let (width, height) = (captured.width(), captured.height());
        RgbaImage::from_raw(width, height, captured.into_raw())
            .ok_or_else(|| CaptureError::Grab("capture buffer size mismatch".into()))
    }
}
