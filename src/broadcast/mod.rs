//! Capture-and-fan-out core
//!
//! One [`Broadcaster`] task samples the frame source at a fixed rate and
//! pushes each frame to every registered [`Listener`].
//!
//! # Architecture
//!
//! ```text
//!                        Broadcaster (one task)
//!                  ┌──────────────────────────────┐
//!                  │ loop {                       │
//!                  │   FrameSource::capture()     │
//!                  │   snapshot(registry)         │
//!                  │   join_all(deliver)          │
//!                  │   reap failures, sleep       │
//!                  │ }                            │
//!                  └──────────────┬───────────────┘
//!                                 │ Frame (shared Bytes)
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    [Listener a]            [Listener b]            [Listener c]
//!    --a / part / ...        --b / part / ...        --c / part / ...
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!        TCP                     TCP                     TCP
//! ```
//!
//! A listener that fails a write is removed in the same tick and never
//! written to again. Every listener registered when a tick starts gets that
//! tick's frame before the next tick begins.

pub mod broadcaster;
pub mod config;
pub mod listener;
pub mod registry;
pub mod state;

pub use broadcaster::Broadcaster;
pub use config::{BroadcasterConfig, TARGET_FPS};
pub use listener::{Listener, StreamSink};
pub use registry::ListenerRegistry;
pub use state::BroadcasterState;
