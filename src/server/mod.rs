//! HTTP server
//!
//! Serves the MJPEG stream endpoint on top of the session manager.

pub mod config;
pub mod http;
pub mod listener;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use http::router;
pub use listener::MjpegServer;
