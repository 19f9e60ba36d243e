//! Keystroke Stream - keystroke timing capture streamed to a server
//!
//! Key presses and releases are timed by a [`capture::KeystrokeCapture`]
//! session and each completed keystroke is sent over a WebSocket as a JSON
//! record, together with focus (visibility) transitions.

pub mod capture;
pub mod config;
pub mod keyboard;
pub mod report;
pub mod status;
pub mod transport;
pub mod ui;
pub mod utils;

#[cfg(test)]
mod test_helpers;

pub use capture::{CaptureHandler, KeystrokeCapture, PendingOnHide, Visibility, WireEvent};
pub use config::Config;
pub use status::StatusSink;
pub use transport::{Endpoint, MemoryTransport, TransportChannel, TransportStatus, WebSocketTransport};
