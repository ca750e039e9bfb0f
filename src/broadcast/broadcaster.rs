//! Capture worker
//!
//! A [`Broadcaster`] owns one periodic task that captures a frame, fans it
//! out to every registered listener and sleeps out the rest of the tick.
//! With no listeners it idles without touching the frame source. A capture
//! failure or an explicit stop ends it for good; listeners still attached at
//! that point are closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::BroadcasterConfig;
use super::listener::Listener;
use super::registry::ListenerRegistry;
use super::state::BroadcasterState;
use crate::capture::FrameSource;
use crate::error::{CaptureError, Error, Result};
use crate::session::SessionId;
use crate::stats::BroadcastStats;

/// State shared between the handle and the capture task
struct Shared {
    registry: ListenerRegistry,
    /// Cleared exactly once, when the broadcaster stops
    running: AtomicBool,
    state: watch::Sender<BroadcasterState>,
    /// Cuts an idle sleep short when a listener arrives
    wakeup: Notify,
    stats: Arc<BroadcastStats>,
}

impl Shared {
    fn set_state(&self, next: BroadcasterState) {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                tracing::debug!(from = %current, to = %next, "Broadcaster state change");
                *current = next;
                true
            } else {
                false
            }
        });
    }

    fn capture_failed(&self, error: &CaptureError) {
        self.stats.record_capture_failure();
        tracing::error!(error = %error, "Frame capture failed, stopping broadcaster");
    }

    /// Stop accepting listeners and close every one still registered
    async fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.set_state(BroadcasterState::Stopped);

        let listeners = self.registry.drain();
        if !listeners.is_empty() {
            tracing::debug!(listeners = listeners.len(), "Closing remaining listeners");
            join_all(listeners.iter().map(|listener| listener.close())).await;
        }
    }
}

/// Handle to a running capture task
pub struct Broadcaster {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Broadcaster {
    /// Start the capture task on the current tokio runtime
    ///
    /// The broadcaster starts `Idle` and begins capturing once a listener is
    /// registered.
    pub fn spawn<S: FrameSource>(
        source: S,
        config: BroadcasterConfig,
        stats: Arc<BroadcastStats>,
    ) -> Self {
        let (state, _) = watch::channel(BroadcasterState::Idle);

        let shared = Arc::new(Shared {
            registry: ListenerRegistry::new(),
            running: AtomicBool::new(true),
            state,
            wakeup: Notify::new(),
            stats,
        });
        shared.stats.record_broadcaster_started();

        let cancel = CancellationToken::new();

        tracing::info!(
            frame_interval_ms = config.frame_interval.as_millis() as u64,
            idle_interval_ms = config.idle_interval.as_millis() as u64,
            "Broadcaster started"
        );

        let task = tokio::spawn(capture_loop(
            source,
            Arc::clone(&shared),
            cancel.clone(),
            config,
        ));

        Self {
            shared,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Attach a listener
    ///
    /// It receives frames starting with the next tick. Fails once the
    /// broadcaster has stopped.
    pub fn register(&self, listener: impl Into<Arc<Listener>>) -> Result<Arc<Listener>> {
        if !self.is_running() {
            return Err(Error::Stopped);
        }

        let listener: Arc<Listener> = listener.into();
        let id = listener.id().clone();

        if !self.shared.registry.insert(Arc::clone(&listener)) {
            return Err(Error::DuplicateSession(id.to_string()));
        }

        // Lost a race with shutdown: the drain may have missed this entry
        if !self.is_running() {
            self.shared.registry.remove(&id);
            return Err(Error::Stopped);
        }

        self.shared.wakeup.notify_one();

        tracing::info!(
            session_id = %id,
            listeners = self.shared.registry.len(),
            "Listener registered"
        );

        Ok(listener)
    }

    /// Detach a listener without closing it
    ///
    /// Returns `None` if it was never registered or has already been reaped.
    pub fn unregister(&self, id: &SessionId) -> Option<Arc<Listener>> {
        let removed = self.shared.registry.remove(id);

        if removed.is_some() {
            tracing::debug!(
                session_id = %id,
                listeners = self.shared.registry.len(),
                "Listener unregistered"
            );
        }

        removed
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.shared.registry.contains(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn state(&self) -> BroadcasterState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<BroadcasterState> {
        self.shared.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        !self.is_running() || self.state().is_stopped()
    }

    /// Signal the capture task to stop after its current tick
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for the capture task to exit
    ///
    /// On return the broadcaster is `Stopped` and every listener is closed.
    pub async fn shutdown(&self) {
        self.stop();

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Capture task ended abnormally");
            }
        }

        self.shared.finish().await;
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("state", &self.state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// The tick loop
///
/// Runs until cancelled or until the source fails. Cancellation is observed
/// at the top of every iteration and during every sleep, never in the middle
/// of a fan-out.
async fn capture_loop<S: FrameSource>(
    mut source: S,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    config: BroadcasterConfig,
) {
    let mut ticks: u64 = 0;

    while !cancel.is_cancelled() {
        if shared.registry.is_empty() {
            shared.set_state(BroadcasterState::Idle);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = shared.wakeup.notified() => {}
                _ = tokio::time::sleep(config.idle_interval) => {}
            }
            continue;
        }

        shared.set_state(BroadcasterState::Capturing);
        let tick_start = Instant::now();

        // Capture and encode are blocking; the source travels to the
        // blocking pool and back each tick.
        let captured = tokio::task::spawn_blocking(move || {
            let result = source.capture();
            (source, result)
        })
        .await;

        // The source is lost along with a panicked worker
        let frame = match captured {
            Ok((returned, Ok(frame))) => {
                source = returned;
                frame
            }
            Ok((_, Err(e))) => {
                shared.capture_failed(&e);
                break;
            }
            Err(e) => {
                shared.capture_failed(&CaptureError::Worker(e.to_string()));
                break;
            }
        };

        ticks += 1;
        shared.stats.record_capture();

        let listeners = shared.registry.snapshot();
        let results = join_all(listeners.iter().map(|listener| listener.deliver(&frame))).await;

        let mut reaped = 0u64;
        for (listener, result) in listeners.iter().zip(results) {
            match result {
                Ok(bytes) => shared.stats.record_delivery(bytes),
                Err(e) => {
                    tracing::debug!(
                        session_id = %listener.id(),
                        error = %e,
                        "Delivery failed, removing listener"
                    );
                    if let Some(listener) = shared.registry.remove(listener.id()) {
                        reaped += 1;
                        tokio::spawn(async move {
                            listener.close().await;
                        });
                    }
                }
            }
        }
        if reaped > 0 {
            shared.stats.record_reaped(reaped);
        }

        let elapsed = tick_start.elapsed();
        tracing::trace!(
            tick = ticks,
            frame_bytes = frame.len(),
            listeners = listeners.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Tick complete"
        );

        // Over budget: start the next tick immediately, no catch-up
        if let Some(remaining) = config.frame_interval.checked_sub(elapsed) {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(remaining) => {}
            }
        }
    }

    shared.finish().await;
    tracing::info!(ticks, "Broadcaster stopped");
}
