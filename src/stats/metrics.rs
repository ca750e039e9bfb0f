//! Broadcast statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::broadcast::BroadcasterState;

/// Process-wide counters, shared by every broadcaster a manager starts
#[derive(Debug)]
pub struct BroadcastStats {
    started_at: Instant,
    frames_captured: AtomicU64,
    deliveries: AtomicU64,
    bytes_sent: AtomicU64,
    listeners_reaped: AtomicU64,
    capture_failures: AtomicU64,
    broadcasters_started: AtomicU64,
}

impl BroadcastStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_captured: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            listeners_reaped: AtomicU64::new(0),
            capture_failures: AtomicU64::new(0),
            broadcasters_started: AtomicU64::new(0),
        }
    }

    pub fn record_capture(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// One part written to one listener
    pub fn record_delivery(&self, bytes: usize) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_reaped(&self, count: u64) {
        self.listeners_reaped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcaster_started(&self) {
        self.broadcasters_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured.load(Ordering::Relaxed)
    }

    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn listeners_reaped(&self) -> u64 {
        self.listeners_reaped.load(Ordering::Relaxed)
    }

    pub fn capture_failures(&self) -> u64 {
        self.capture_failures.load(Ordering::Relaxed)
    }

    pub fn broadcasters_started(&self) -> u64 {
        self.broadcasters_started.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average capture rate since the counters were created
    pub fn capture_rate(&self) -> f64 {
        let secs = self.uptime().as_secs_f64();
        if secs > 0.0 {
            self.frames_captured() as f64 / secs
        } else {
            0.0
        }
    }

    /// Point-in-time copy, combined with the caller's live gauges
    pub fn snapshot(
        &self,
        active_connections: usize,
        listeners: usize,
        state: Option<BroadcasterState>,
    ) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            frames_captured: self.frames_captured(),
            capture_rate: self.capture_rate(),
            deliveries: self.deliveries(),
            bytes_sent: self.bytes_sent(),
            listeners_reaped: self.listeners_reaped(),
            capture_failures: self.capture_failures(),
            broadcasters_started: self.broadcasters_started(),
            active_connections,
            listeners,
            state,
        }
    }
}

impl Default for BroadcastStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub frames_captured: u64,
    /// Frames per second averaged over the uptime
    pub capture_rate: f64,
    pub deliveries: u64,
    pub bytes_sent: u64,
    pub listeners_reaped: u64,
    pub capture_failures: u64,
    pub broadcasters_started: u64,
    /// Open stream connections
    pub active_connections: usize,
    /// Listeners attached to the live broadcaster
    pub listeners: usize,
    /// `None` before the first viewer connects
    pub state: Option<BroadcasterState>,
}
