//! Frame production
//!
//! A [`FrameSource`] yields one encoded JPEG [`Frame`] per call. The stock
//! implementation, [`ScreenFrameSource`], pairs a [`ScreenGrabber`] (raw
//! pixels) with a [`JpegEncoder`]. Broadcasters open a fresh source through a
//! [`FrameSourceFactory`] each time one is started.
//!
//! ```text
//!   ScreenGrabber::grab() ──► RgbaImage ──► JpegEncoder::encode() ──► Frame
//! ```

pub mod encoder;
pub mod frame;
pub mod pattern;
#[cfg(feature = "screen")]
pub mod screen;
pub mod source;

pub use encoder::{JpegEncoder, DEFAULT_JPEG_QUALITY};
pub use frame::Frame;
pub use pattern::TestPattern;
#[cfg(feature = "screen")]
pub use screen::PrimaryMonitor;
pub use source::{FrameSource, FrameSourceFactory, ScreenFrameSource, ScreenGrabber};
