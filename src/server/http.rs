//! HTTP boundary
//!
//! | Method    | Path       | Response                                        |
//! |-----------|------------|-------------------------------------------------|
//! | `GET`     | stream     | `multipart/x-mixed-replace` body, one JPEG/part |
//! | `OPTIONS` | stream     | 200, empty body, CORS headers                   |
//! | other     | stream     | 405, empty body                                 |
//! | `GET`     | `/stats`   | JSON counters                                   |
//!
//! Each GET gets an in-memory pipe: the broadcaster writes framed parts into
//! one end, the response body streams the other end to the client. When the
//! body is dropped (client gone, stream finished) the session is reported
//! closed.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, response::Builder, Method, Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use bytes::Bytes;
use futures::Stream;
use tokio::io::DuplexStream;
use tokio_util::io::ReaderStream;

use super::config::ServerConfig;
use crate::error::Error;
use crate::session::{SessionId, StreamHooks};
use crate::stats::StatsSnapshot;

/// Methods accepted on the stream path
pub const ALLOW_METHODS: &str = "GET, OPTIONS";

/// Request headers a browser may send cross-origin
pub const ALLOW_HEADERS: &str = "Content-Type, Content-Length, Content-Disposition, \
     Content-Transfer-Encoding, Accept, Accept-Language, Accept-Encoding, User-Agent";

/// Path of the statistics endpoint
pub const STATS_PATH: &str = "/stats";

#[derive(Clone)]
struct AppState {
    hooks: Arc<dyn StreamHooks>,
    sink_buffer: usize,
}

/// Build the router for the stream and stats endpoints
pub fn router(hooks: Arc<dyn StreamHooks>, config: &ServerConfig) -> Router {
    let state = AppState {
        hooks,
        sink_buffer: config.sink_buffer,
    };

    Router::new()
        .route(&config.stream_path, any(handle_stream))
        .route(STATS_PATH, get(handle_stats))
        .with_state(state)
}

async fn handle_stream(method: Method, State(state): State<AppState>) -> Response {
    match method {
        Method::GET => open_stream(&state),
        Method::OPTIONS => preflight(),
        other => {
            tracing::debug!(method = %other, "Stream request rejected");
            StatusCode::METHOD_NOT_ALLOWED.into_response()
        }
    }
}

async fn handle_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.hooks.stats())
}

fn with_cors(builder: Builder) -> Builder {
    builder
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
}

fn preflight() -> Response {
    with_cors(HttpResponse::builder().status(StatusCode::OK))
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn open_stream(state: &AppState) -> Response {
    let (writer, reader) = tokio::io::duplex(state.sink_buffer);

    let id = match state.hooks.on_connect(Box::new(writer)) {
        Ok(id) => id,
        Err(e @ (Error::ConnectionLimit(_) | Error::ShuttingDown)) => {
            tracing::warn!(error = %e, "Stream request refused");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to open stream");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content_type = format!("multipart/x-mixed-replace; boundary={}", id);
    let body = Body::from_stream(SessionStream {
        parts: ReaderStream::new(reader),
        _guard: SessionGuard {
            id,
            hooks: Arc::clone(&state.hooks),
        },
    });

    with_cors(HttpResponse::builder().status(StatusCode::OK))
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Reports the session closed when the response body goes away
struct SessionGuard {
    id: SessionId,
    hooks: Arc<dyn StreamHooks>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.hooks.on_disconnect(&self.id);
    }
}

/// Response body: the read end of the listener's pipe
struct SessionStream {
    parts: ReaderStream<DuplexStream>,
    _guard: SessionGuard,
}

impl Stream for SessionStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.parts).poll_next(cx)
    }
}
