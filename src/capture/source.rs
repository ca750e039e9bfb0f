//! Frame source traits and the grab + encode composition

use image::RgbaImage;

use super::encoder::JpegEncoder;
use super::frame::Frame;
use crate::error::CaptureError;

/// Produces one encoded frame per call
///
/// Called from a blocking context once per tick. Each returned [`Frame`]
/// must own its buffer: listeners may still be writing the previous frame
/// while the next capture runs.
pub trait FrameSource: Send + 'static {
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}

/// Opens a fresh [`FrameSource`] for each broadcaster
///
/// Implemented for any `Fn() -> Result<S, CaptureError>` closure. `open` is
/// called with the session lock held, on an async worker thread, so it
/// should only acquire the device handle and leave grabbing to `capture`.
pub trait FrameSourceFactory: Send + Sync + 'static {
    type Source: FrameSource;

    fn open(&self) -> Result<Self::Source, CaptureError>;
}

impl<F, S> FrameSourceFactory for F
where
    F: Fn() -> Result<S, CaptureError> + Send + Sync + 'static,
    S: FrameSource,
{
    type Source = S;

    fn open(&self) -> Result<S, CaptureError> {
        self()
    }
}

/// Grabs raw screen pixels
pub trait ScreenGrabber: Send + 'static {
    fn grab(&mut self) -> Result<RgbaImage, CaptureError>;
}

/// [`FrameSource`] that grabs with `G` and encodes to JPEG
pub struct ScreenFrameSource<G> {
    grabber: G,
    encoder: JpegEncoder,
}

impl<G: ScreenGrabber> ScreenFrameSource<G> {
    pub fn new(grabber: G, encoder: JpegEncoder) -> Self {
        Self { grabber, encoder }
    }

    pub fn encoder(&self) -> &JpegEncoder {
        &self.encoder
    }
}

impl<G: ScreenGrabber> FrameSource for ScreenFrameSource<G> {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let image = self.grabber.grab()?;
        let data = self.encoder.encode(image)?;
        Ok(Frame::new(data))
    }
}
