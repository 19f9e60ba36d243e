//! Shared test utilities
//!
//! Events are timestamped relative to a fixed origin so that timing
//! assertions are exact.

use crate::capture::KeystrokeCapture;
use crate::keyboard::{KeyEvent, KeyEventType};
use crate::transport::MemoryTransport;
use std::time::{Duration, Instant};

/// Instant `ms` milliseconds after `origin`
pub fn at(origin: Instant, ms: u64) -> Instant {
    origin + Duration::from_millis(ms)
}

/// A session over an open in-memory transport, plus a handle to that
/// transport and the session origin
pub fn session_at() -> (KeystrokeCapture<MemoryTransport>, MemoryTransport, Instant) {
    let transport = MemoryTransport::opened();
    let origin = Instant::now();
    let capture = KeystrokeCapture::new(transport.clone(), origin);
    (capture, transport, origin)
}

/// Key press `ms` after `origin`
pub fn press_at(key: &str, origin: Instant, ms: u64) -> KeyEvent {
    KeyEvent::new(key, KeyEventType::Press, at(origin, ms))
}

/// Key release `ms` after `origin`
pub fn release_at(key: &str, origin: Instant, ms: u64) -> KeyEvent {
    KeyEvent::new(key, KeyEventType::Release, at(origin, ms))
}
