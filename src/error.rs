//! Error types
//!
//! The crate-wide [`Error`] plus the narrower errors raised by the capture
//! path and by individual listeners.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Result alias using the crate-wide [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the session manager and server
#[derive(Debug)]
pub enum Error {
    /// Frame source could not be opened or failed mid-session
    Capture(CaptureError),
    /// The listening socket could not be bound
    Bind {
        addr: SocketAddr,
        source: io::Error,
    },
    /// The broadcaster has stopped and no longer accepts listeners
    Stopped,
    /// A listener with this session id is already registered
    DuplicateSession(String),
    /// The session manager is shutting down
    ShuttingDown,
    /// The configured connection limit has been reached
    ConnectionLimit(usize),
    /// I/O error outside of listener delivery
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Capture(e) => write!(f, "Capture error: {}", e),
            Error::Bind { addr, source } => write!(f, "Failed to bind {}: {}", addr, source),
            Error::Stopped => write!(f, "Broadcaster is stopped"),
            Error::DuplicateSession(id) => write!(f, "Session already registered: {}", id),
            Error::ShuttingDown => write!(f, "Server is shutting down"),
            Error::ConnectionLimit(max) => write!(f, "Connection limit reached ({})", max),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Capture(e) => Some(e),
            Error::Bind { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Error::Capture(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Failure to produce a frame
///
/// Any of these ends the broadcaster that hit it; capture devices are
/// assumed to stay broken for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No capture device, or the device could not be opened
    Unavailable(String),
    /// Pixel grab failed
    Grab(String),
    /// JPEG encoding failed
    Encode(String),
    /// The blocking capture task panicked or was cancelled
    Worker(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Unavailable(msg) => write!(f, "Capture device unavailable: {}", msg),
            CaptureError::Grab(msg) => write!(f, "Screen grab failed: {}", msg),
            CaptureError::Encode(msg) => write!(f, "JPEG encoding failed: {}", msg),
            CaptureError::Worker(msg) => write!(f, "Capture worker failed: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Failure to deliver a frame to one listener
///
/// Local to that listener: it is removed and never retried.
#[derive(Debug)]
pub enum DeliveryError {
    /// Write or flush failed (broken pipe, reset, ...)
    Io(io::Error),
    /// The part could not be written within the write timeout
    Timeout(Duration),
    /// The listener was already closed
    Closed,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Io(e) => write!(f, "Write failed: {}", e),
            DeliveryError::Timeout(d) => write!(f, "Write timed out after {:?}", d),
            DeliveryError::Closed => write!(f, "Listener closed"),
        }
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DeliveryError {
    fn from(e: io::Error) -> Self {
        DeliveryError::Io(e)
    }
}
