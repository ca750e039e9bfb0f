//! Session manager

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::AsyncWrite;

use super::id::SessionId;
use crate::broadcast::{Broadcaster, BroadcasterConfig, Listener, StreamSink};
use crate::capture::FrameSourceFactory;
use crate::error::{Error, Result};
use crate::stats::{BroadcastStats, StatsSnapshot};

/// Entry points the HTTP boundary calls into
///
/// Keeps the router independent of the frame source type, and lets it be
/// tested against a fake.
pub trait StreamHooks: Send + Sync + 'static {
    /// A viewer opened a stream; returns its session id (the boundary)
    fn on_connect(&self, sink: StreamSink) -> Result<SessionId>;

    /// The viewer's connection ended; idempotent
    fn on_disconnect(&self, id: &SessionId);

    fn stats(&self) -> StatsSnapshot;
}

/// Connection bookkeeping, guarded by one lock
#[derive(Default)]
struct Inner {
    /// Open stream connections
    sessions: HashSet<SessionId>,
    /// Current broadcaster, possibly stopped
    broadcaster: Option<Arc<Broadcaster>>,
    shutting_down: bool,
}

/// Owns the broadcaster lifecycle and the active-connection count
///
/// At most one live broadcaster exists per manager. It is started by the
/// first stream request, idles when viewers leave, and is replaced only
/// after it has stopped.
pub struct SessionManager<F: FrameSourceFactory> {
    factory: F,
    config: BroadcasterConfig,
    max_connections: usize,
    stats: Arc<BroadcastStats>,
    inner: Mutex<Inner>,
}

impl<F: FrameSourceFactory> SessionManager<F> {
    pub fn new(factory: F, config: BroadcasterConfig) -> Self {
        Self {
            factory,
            config,
            max_connections: 0,
            stats: Arc::new(BroadcastStats::new()),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Limit concurrent streams (0 = unlimited)
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Attach a new viewer
    ///
    /// Starts a broadcaster if none is live, then registers a listener
    /// writing to `sink`. A factory failure is returned as-is and leaves the
    /// connection count untouched.
    pub fn on_stream_request<W>(&self, sink: W) -> Result<SessionId>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut inner = self.inner.lock();

        if inner.shutting_down {
            return Err(Error::ShuttingDown);
        }

        if self.max_connections > 0 && inner.sessions.len() >= self.max_connections {
            tracing::warn!(
                max_connections = self.max_connections,
                "Stream rejected: limit reached"
            );
            return Err(Error::ConnectionLimit(self.max_connections));
        }

        let live = inner
            .broadcaster
            .as_ref()
            .filter(|broadcaster| !broadcaster.is_stopped())
            .cloned();
        let broadcaster = match live {
            Some(broadcaster) => broadcaster,
            None => self.start_broadcaster(&mut inner)?,
        };

        let id = SessionId::generate();
        let listener = Arc::new(Listener::new(id.clone(), sink, self.config.write_timeout));
        self.attach(&mut inner, &broadcaster, listener)?;
        inner.sessions.insert(id.clone());

        tracing::info!(
            session_id = %id,
            active_connections = inner.sessions.len(),
            "Stream opened"
        );

        Ok(id)
    }

    /// Open a frame source and start a broadcaster on it
    ///
    /// Runs under the session lock; the factory's `open` is expected to be
    /// quick (device lookup only).
    fn start_broadcaster(&self, inner: &mut Inner) -> Result<Arc<Broadcaster>> {
        let source = self.factory.open().map_err(|e| {
            tracing::error!(error = %e, "Failed to open frame source");
            e
        })?;

        let broadcaster = Arc::new(Broadcaster::spawn(
            source,
            self.config.clone(),
            Arc::clone(&self.stats),
        ));
        inner.broadcaster = Some(Arc::clone(&broadcaster));
        Ok(broadcaster)
    }

    /// Register `listener`, replacing the broadcaster once if it stopped
    /// after it was picked
    fn attach(
        &self,
        inner: &mut Inner,
        broadcaster: &Broadcaster,
        listener: Arc<Listener>,
    ) -> Result<()> {
        match broadcaster.register(Arc::clone(&listener)) {
            Ok(_) => Ok(()),
            // A drained listener has had its sink shut down already
            Err(Error::Stopped) if !listener.is_closed() => {
                tracing::warn!(
                    session_id = %listener.id(),
                    "Broadcaster stopped during registration, starting a new one"
                );
                let replacement = self.start_broadcaster(inner)?;
                replacement.register(listener)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Detach a viewer
    ///
    /// Best-effort: the broadcaster may already have dropped the listener
    /// after a failed write.
    pub fn on_stream_closed(&self, id: &SessionId) {
        let broadcaster = {
            let mut inner = self.inner.lock();
            if !inner.sessions.remove(id) {
                return;
            }
            tracing::info!(
                session_id = %id,
                active_connections = inner.sessions.len(),
                "Stream closed"
            );
            inner.broadcaster.clone()
        };

        let Some(listener) = broadcaster.and_then(|b| b.unregister(id)) else {
            return;
        };

        // Without a runtime (process teardown) dropping the sink is enough
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                listener.close().await;
            });
        }
    }

    /// Stop the broadcaster and wait for its loop to exit
    ///
    /// Every listener is closed on return. Later stream requests fail with
    /// [`Error::ShuttingDown`].
    pub async fn shutdown(&self) {
        let broadcaster = {
            let mut inner = self.inner.lock();
            inner.shutting_down = true;
            inner.sessions.clear();
            inner.broadcaster.clone()
        };

        if let Some(broadcaster) = broadcaster {
            tracing::info!(listeners = broadcaster.listener_count(), "Stopping broadcaster");
            broadcaster.shutdown().await;
        }
    }

    pub fn active_connections(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    /// The current broadcaster, if one was ever started
    pub fn broadcaster(&self) -> Option<Arc<Broadcaster>> {
        self.inner.lock().broadcaster.clone()
    }

    pub fn counters(&self) -> &Arc<BroadcastStats> {
        &self.stats
    }

    pub fn stats(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        let (listeners, state) = match inner.broadcaster.as_ref() {
            Some(b) => (b.listener_count(), Some(b.state())),
            None => (0, None),
        };
        self.stats.snapshot(inner.sessions.len(), listeners, state)
    }
}

impl<F: FrameSourceFactory> StreamHooks for SessionManager<F> {
    fn on_connect(&self, sink: StreamSink) -> Result<SessionId> {
        self.on_stream_request(sink)
    }

    fn on_disconnect(&self, id: &SessionId) {
        self.on_stream_closed(id)
    }

    fn stats(&self) -> StatsSnapshot {
        SessionManager::stats(self)
    }
}
