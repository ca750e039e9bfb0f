//! Counters for the capture and fan-out core

pub mod metrics;

pub use metrics::{BroadcastStats, StatsSnapshot};
