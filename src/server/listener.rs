//! MJPEG server listener
//!
//! Binds the TCP socket and serves the HTTP router until shut down.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::serve::ListenerExt;
use tokio::net::TcpListener;

use super::config::ServerConfig;
use super::http::router;
use crate::capture::FrameSourceFactory;
use crate::error::{Error, Result};
use crate::session::{SessionManager, StreamHooks};

/// MJPEG screen-sharing server
pub struct MjpegServer<F: FrameSourceFactory> {
    config: ServerConfig,
    sessions: Arc<SessionManager<F>>,
}

impl<F: FrameSourceFactory> MjpegServer<F> {
    /// Create a new server; `factory` opens the frame source for each
    /// broadcaster
    pub fn new(config: ServerConfig, factory: F) -> Self {
        let sessions = SessionManager::new(factory, config.broadcaster())
            .max_connections(config.max_connections);

        Self {
            config,
            sessions: Arc::new(sessions),
        }
    }

    /// Get a reference to the session manager
    pub fn sessions(&self) -> &Arc<SessionManager<F>> {
        &self.sessions
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr;
        TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })
    }

    /// Run the server until the process ends
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    ///
    /// When `shutdown` completes the broadcaster is stopped first, which
    /// ends every open stream, then the HTTP server drains.
    pub async fn run_until<S>(&self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<S>(&self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            path = %self.config.stream_path,
            "MJPEG server listening"
        );

        let hooks: Arc<dyn StreamHooks> = self.sessions.clone();
        let app = router(hooks, &self.config);

        let tcp_nodelay = self.config.tcp_nodelay;
        let listener = listener.tap_io(move |socket| {
            if tcp_nodelay {
                if let Err(e) = socket.set_nodelay(true) {
                    tracing::trace!(error = %e, "Failed to set TCP_NODELAY");
                }
            }
        });

        let sessions = Arc::clone(&self.sessions);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                sessions.shutdown().await;
            })
            .await?;

        tracing::info!("MJPEG server stopped");
        Ok(())
    }
}
