//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::broadcast::{BroadcasterConfig, TARGET_FPS};
use crate::capture::DEFAULT_JPEG_QUALITY;

/// Default port when none (or an invalid one) is given
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path of the MJPEG endpoint
    pub stream_path: String,

    /// Maximum concurrent streams (0 = unlimited)
    pub max_connections: usize,

    /// Capture tick budget
    pub frame_interval: Duration,

    /// Sleep between checks while nobody is watching
    pub idle_interval: Duration,

    /// Bound on writing one part to one viewer
    pub write_timeout: Duration,

    /// Per-connection buffer between the broadcaster and the HTTP body
    pub sink_buffer: usize,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Enable TCP_NODELAY on accepted connections
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            stream_path: "/stream".to_string(),
            max_connections: 0, // Unlimited
            frame_interval: Duration::from_millis(1000 / TARGET_FPS),
            idle_interval: Duration::from_secs(1),
            write_timeout: Duration::from_secs(2),
            sink_buffer: 1024 * 1024, // 1MB, a few frames
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            tcp_nodelay: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the stream path; a leading `/` is added if missing
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.stream_path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the capture rate
    pub fn fps(mut self, fps: u64) -> Self {
        self.frame_interval = Duration::from_millis(1000 / fps.max(1));
        self
    }

    /// Set the idle check interval
    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    /// Set the per-listener write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set JPEG quality
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Broadcaster settings derived from this config
    pub fn broadcaster(&self) -> BroadcasterConfig {
        BroadcasterConfig::default()
            .frame_interval(self.frame_interval)
            .idle_interval(self.idle_interval)
            .write_timeout(self.write_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.stream_path, "/stream");
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.frame_interval, Duration::from_millis(66));
        assert_eq!(config.idle_interval, Duration::from_secs(1));
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 9090);
    }

    #[test]
    fn test_builder_stream_path() {
        assert_eq!(ServerConfig::default().stream_path("live").stream_path, "/live");
        assert_eq!(ServerConfig::default().stream_path("/mjpeg").stream_path, "/mjpeg");
    }

    #[test]
    fn test_builder_jpeg_quality_clamped() {
        assert_eq!(ServerConfig::default().jpeg_quality(0).jpeg_quality, 1);
        assert_eq!(ServerConfig::default().jpeg_quality(150).jpeg_quality, 100);
    }

    #[test]
    fn test_broadcaster_config() {
        let config = ServerConfig::default()
            .fps(10)
            .idle_interval(Duration::from_millis(500))
            .write_timeout(Duration::from_secs(5));
        let broadcaster = config.broadcaster();

        assert_eq!(broadcaster.frame_interval, Duration::from_millis(100));
        assert_eq!(broadcaster.idle_interval, Duration::from_millis(500));
        assert_eq!(broadcaster.write_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(5)
            .stream_path("/screen");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.stream_path, "/screen");
    }
}
