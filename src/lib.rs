//! # sharescreen
//!
//! Live screen sharing over HTTP as an MJPEG stream.
//!
//! Every client that requests the stream endpoint receives a
//! `multipart/x-mixed-replace` response whose parts are JPEG snapshots of
//! the screen. A single capture loop serves all clients: each tick grabs
//! one frame and writes the same bytes to every connected listener.
//! Listeners whose writes fail are dropped without affecting the others.
//!
//! ## Example
//!
//! ```no_run
//! use sharescreen::capture::{JpegEncoder, ScreenFrameSource, TestPattern};
//! use sharescreen::{CaptureError, MjpegServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> sharescreen::Result<()> {
//!     let config = ServerConfig::default();
//!     let quality = config.jpeg_quality;
//!     let factory = move || {
//!         Ok::<_, CaptureError>(ScreenFrameSource::new(
//!             TestPattern::default(),
//!             JpegEncoder::new(quality),
//!         ))
//!     };
//!
//!     MjpegServer::new(config, factory).run().await
//! }
//! ```

pub mod broadcast;
pub mod capture;
pub mod error;
pub mod server;
pub mod session;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::{Broadcaster, BroadcasterConfig, BroadcasterState};
pub use capture::{Frame, FrameSource, FrameSourceFactory};
pub use error::{CaptureError, DeliveryError, Error, Result};
pub use server::{MjpegServer, ServerConfig, DEFAULT_PORT};
pub use session::{SessionId, SessionManager, StreamHooks};
pub use stats::{BroadcastStats, StatsSnapshot};
