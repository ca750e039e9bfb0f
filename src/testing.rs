//! Shared test fixtures

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::broadcast::{Broadcaster, BroadcasterState};
use crate::capture::{Frame, FrameSource, FrameSourceFactory};
use crate::error::CaptureError;

const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Counts calls to `capture`
#[derive(Debug, Clone, Default)]
pub(crate) struct CaptureCounter(Arc<AtomicUsize>);

impl CaptureCounter {
    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Scripted frame source
///
/// Frame payloads embed a sequence number between JPEG markers and include
/// CR/LF bytes to check that framing passes binary data through untouched.
pub(crate) struct MockSource {
    captures: CaptureCounter,
    fail_after: Option<usize>,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self {
            captures: CaptureCounter::default(),
            fail_after: None,
        }
    }

    /// Succeeds `n` times, then fails every call
    pub(crate) fn failing_after(n: usize) -> Self {
        Self {
            captures: CaptureCounter::default(),
            fail_after: Some(n),
        }
    }

    pub(crate) fn captures(&self) -> CaptureCounter {
        self.captures.clone()
    }

    pub(crate) fn sequence(payload: &[u8]) -> u64 {
        let text = String::from_utf8_lossy(&payload[4..payload.len() - 2]);
        text.trim_start_matches("frame-").parse().unwrap_or(0)
    }
}

impl FrameSource for MockSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let n = self.captures.0.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.fail_after {
            if n > limit {
                return Err(CaptureError::Grab("display disconnected".into()));
            }
        }

        let mut payload = vec![0xFF, 0xD8, b'\r', b'\n'];
        payload.extend_from_slice(format!("frame-{}", n).as_bytes());
        payload.extend_from_slice(&[0xFF, 0xD9]);
        Ok(Frame::new(payload))
    }
}

/// Factory producing [`MockSource`]s, counting opens
#[derive(Default)]
pub(crate) struct MockFactory {
    opens: Arc<AtomicUsize>,
    fail_open: AtomicBool,
    fail_after: Option<usize>,
}

impl MockFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every source it opens fails after `n` captures
    pub(crate) fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl FrameSourceFactory for MockFactory {
    type Source = MockSource;

    fn open(&self) -> Result<MockSource, CaptureError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(CaptureError::Unavailable("no display".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(match self.fail_after {
            Some(n) => MockSource::failing_after(n),
            None => MockSource::new(),
        })
    }
}

/// One parsed multipart part
#[derive(Debug)]
pub(crate) struct Part {
    pub(crate) boundary: String,
    pub(crate) content_type: String,
    pub(crate) content_length: usize,
    pub(crate) payload: Vec<u8>,
}

/// Read one part; `None` on EOF or malformed input
pub(crate) async fn read_part<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Part> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let boundary = line.strip_prefix("--")?.trim_end_matches("\r\n").to_string();

    let mut content_type = String::new();
    let mut content_length = None;
    loop {
        line.clear();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let header = line.trim_end_matches("\r\n");
        if header.is_empty() {
            break;
        }
        if let Some(value) = header.strip_prefix("Content-Type: ") {
            content_type = value.to_string();
        } else if let Some(value) = header.strip_prefix("Content-Length: ") {
            content_length = value.parse().ok();
        }
    }

    let content_length = content_length?;
    let mut payload = vec![0u8; content_length];
    reader.read_exact(&mut payload).await.ok()?;

    let mut trailer = [0u8; 4];
    reader.read_exact(&mut trailer).await.ok()?;
    if &trailer != b"\r\n\r\n" {
        return None;
    }

    Some(Part {
        boundary,
        content_type,
        content_length,
        payload,
    })
}

/// Poll `condition` until it holds or the wait limit passes
pub(crate) async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Wait until the broadcaster reaches `state`
pub(crate) async fn wait_for_state(broadcaster: &Broadcaster, state: BroadcasterState) -> bool {
    let mut rx = broadcaster.subscribe_state();
    let reached = matches!(
        tokio::time::timeout(WAIT_LIMIT, rx.wait_for(|current| *current == state)).await,
        Ok(Ok(_))
    );
    reached
}
