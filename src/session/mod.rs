//! Stream sessions
//!
//! The [`SessionManager`] sits between the HTTP boundary and the
//! broadcaster: it starts a broadcaster for the first viewer, attaches a
//! listener per stream request and detaches it when the connection ends.

pub mod id;
pub mod manager;

pub use id::SessionId;
pub use manager::{SessionManager, StreamHooks};
