//! Per-connection MJPEG framing
//!
//! A [`Listener`] owns one viewer's output sink and turns each frame into a
//! multipart part:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <N>\r\n
//! \r\n
//! <N bytes of JPEG>\r\n
//! \r\n
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::capture::Frame;
use crate::error::DeliveryError;
use crate::session::SessionId;

/// Type-erased output sink for one viewer
pub type StreamSink = Box<dyn AsyncWrite + Send + Unpin>;

const PART_CONTENT_TYPE: &str = "Content-Type: image/jpeg\r\n";
const PART_TRAILER: &[u8] = b"\r\n\r\n";

/// One viewer's streaming connection
pub struct Listener {
    id: SessionId,
    /// Boundary line and content type, fixed for the listener's lifetime
    part_header: Bytes,
    sink: Mutex<Option<StreamSink>>,
    write_timeout: Duration,
    closed: AtomicBool,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl Listener {
    /// Create a listener; the session id doubles as the multipart boundary
    pub fn new<W>(id: SessionId, sink: W, write_timeout: Duration) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let part_header = Bytes::from(format!("--{}\r\n{}", id, PART_CONTENT_TYPE));

        Self {
            id,
            part_header,
            sink: Mutex::new(Some(Box::new(sink))),
            write_timeout,
            closed: AtomicBool::new(false),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Multipart boundary (without the leading dashes)
    pub fn boundary(&self) -> &str {
        self.id.as_str()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Write one framed part and flush
    ///
    /// Returns the number of bytes written. Any failure, including the write
    /// not completing within the write timeout, condemns the listener; the
    /// caller is expected to drop it rather than retry.
    pub async fn deliver(&self, frame: &Frame) -> Result<usize, DeliveryError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(DeliveryError::Closed)?;

        let length_header = format!("Content-Length: {}\r\n\r\n", frame.len());
        let total = self.part_header.len() + length_header.len() + frame.len() + PART_TRAILER.len();

        let write = async {
            sink.write_all(&self.part_header).await?;
            sink.write_all(length_header.as_bytes()).await?;
            sink.write_all(frame.data()).await?;
            sink.write_all(PART_TRAILER).await?;
            sink.flush().await
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => {
                self.frames_sent.fetch_add(1, Ordering::Relaxed);
                self.bytes_sent.fetch_add(total as u64, Ordering::Relaxed);
                Ok(total)
            }
            Ok(Err(e)) => Err(DeliveryError::Io(e)),
            Err(_) => Err(DeliveryError::Timeout(self.write_timeout)),
        }
    }

    /// Flush and shut down the sink
    ///
    /// Idempotent. Teardown errors are logged and swallowed; the return value
    /// only reports whether this call closed the sink cleanly.
    pub async fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let Some(mut sink) = self.sink.lock().await.take() else {
            return false;
        };

        let teardown = async {
            sink.flush().await?;
            sink.shutdown().await
        };

        match tokio::time::timeout(self.write_timeout, teardown).await {
            Ok(Ok(())) => {
                tracing::debug!(session_id = %self.id, "Listener closed");
                true
            }
            Ok(Err(e)) => {
                tracing::debug!(session_id = %self.id, error = %e, "Error while closing listener");
                false
            }
            Err(_) => {
                tracing::debug!(session_id = %self.id, "Timed out closing listener");
                false
            }
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("frames_sent", &self.frames_sent())
            .finish()
    }
}
