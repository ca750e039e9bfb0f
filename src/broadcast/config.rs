//! Broadcaster configuration

use std::time::Duration;

/// Nominal capture rate
pub const TARGET_FPS: u64 = 15;

/// Broadcaster timing options
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Budget for one capture tick (capture + encode + fan-out)
    pub frame_interval: Duration,

    /// Sleep between checks while no listener is registered
    pub idle_interval: Duration,

    /// Upper bound on writing one part to one listener
    pub write_timeout: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(1000 / TARGET_FPS), // ~66ms
            idle_interval: Duration::from_secs(1),
            write_timeout: Duration::from_secs(2),
        }
    }
}

impl BroadcasterConfig {
    /// Set the tick budget from a frame rate; zero is treated as one
    pub fn fps(mut self, fps: u64) -> Self {
        self.frame_interval = Duration::from_millis(1000 / fps.max(1));
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BroadcasterConfig::default();

        assert_eq!(config.frame_interval, Duration::from_millis(66));
        assert_eq!(config.idle_interval, Duration::from_secs(1));
        assert_eq!(config.write_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_fps() {
        assert_eq!(
            BroadcasterConfig::default().fps(30).frame_interval,
            Duration::from_millis(33)
        );
        assert_eq!(
            BroadcasterConfig::default().fps(0).frame_interval,
            Duration::from_secs(1)
        );
    }
}
