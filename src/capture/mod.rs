//! Keystroke timing capture
//!
//! [`KeystrokeCapture`] owns all capture state: the set of keys currently
//! held, the timestamp of the last completed release, and whether the host
//! is visible. It is driven through the [`CaptureHandler`] methods and writes
//! every completed keystroke or visibility transition to its transport as a
//! one-element JSON array.
//!
//! Timestamps are milliseconds since the session was created, taken from the
//! `Instant` carried by each event.

mod record;

pub use record::{KeystrokeRecord, PageEvent, PendingKeystroke, VisibilityRecord, WireEvent};

use crate::keyboard::{KeyEvent, KeyEventType};
use crate::status::StatusSink;
use crate::transport::TransportChannel;
use log::{debug, log, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Whether the host window is in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// What happens to held keys when the host becomes hidden
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOnHide {
    /// Drop every pending key without emitting it
    #[default]
    Discard,
    /// Keep pending keys and still accept their releases while hidden
    AcceptRelease,
    /// Keep pending keys and ignore releases while hidden
    Keep,
}

/// Receiver of host input and visibility events.
///
/// Each method returns the event written to the transport, if any.
pub trait CaptureHandler {
    fn on_key_down(&mut self, key: &str, at: Instant) -> Option<WireEvent>;

    fn on_key_up(&mut self, key: &str, at: Instant) -> Option<WireEvent>;

    fn on_visibility_change(&mut self, visibility: Visibility, at: Instant) -> Option<WireEvent>;

    /// Dispatch a keyboard event to the matching handler
    fn on_key_event(&mut self, event: &KeyEvent) -> Option<WireEvent> {
        match event.event_type {
            KeyEventType::Press => self.on_key_down(&event.key, event.timestamp),
            KeyEventType::Release => self.on_key_up(&event.key, event.timestamp),
        }
    }
}

/// A capture session writing to transport `T`
pub struct KeystrokeCapture<T: TransportChannel> {
    transport: T,
    origin: Instant,
    pending: HashMap<String, PendingKeystroke>,
    last_release: f64,
    visibility: Visibility,
    pending_on_hide: PendingOnHide,
    closed: bool,
}

impl<T: TransportChannel> KeystrokeCapture<T> {
    /// Start a session; `origin` is time zero for every timestamp
    pub fn new(transport: T, origin: Instant) -> Self {
        Self {
            transport,
            origin,
            pending: HashMap::new(),
            last_release: 0.0,
            visibility: Visibility::Visible,
            pending_on_hide: PendingOnHide::default(),
            closed: false,
        }
    }

    pub fn with_pending_on_hide(mut self, policy: PendingOnHide) -> Self {
        self.pending_on_hide = policy;
        self
    }

    /// Milliseconds between the session origin and `at`
    pub fn millis(&self, at: Instant) -> f64 {
        at.saturating_duration_since(self.origin).as_nanos() as f64 / 1_000_000.0
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn pending_on_hide(&self) -> PendingOnHide {
        self.pending_on_hide
    }

    /// Release time of the last emitted keystroke, 0 before the first
    pub fn last_release(&self) -> f64 {
        self.last_release
    }

    pub fn pending(&self, key: &str) -> Option<&PendingKeystroke> {
        self.pending.get(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Keys currently held, sorted for stable display
    pub fn pending_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.pending.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Forward every queued transport notification to `sink`, verbatim
    pub fn pump_status<S: StatusSink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut count = 0;
        while let Some(status) = self.transport.try_recv_status() {
            let text = status.text();
            log!(status.log_level(), "transport: {}", text);
            sink.set_text(&text);
            count += 1;
        }
        count
    }

    /// End the session. Pending keys are dropped and the transport closed;
    /// later events are ignored.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if !self.pending.is_empty() {
            debug!("closing with {} pending key(s)", self.pending.len());
        }
        self.pending.clear();
        self.transport.close();
        self.closed = true;
    }

    fn emit(&self, event: WireEvent) -> Option<WireEvent> {
        match event.to_message() {
            Ok(message) => {
                self.transport.send(message);
                Some(event)
            }
            Err(e) => {
                warn!("failed to serialize event: {}", e);
                None
            }
        }
    }

    fn accepts_release_while_hidden(&self) -> bool {
        self.pending_on_hide == PendingOnHide::AcceptRelease
    }
}

impl<T: TransportChannel> CaptureHandler for KeystrokeCapture<T> {
    fn on_key_down(&mut self, key: &str, at: Instant) -> Option<WireEvent> {
        if self.closed || !self.is_visible() {
            return None;
        }
        if self.pending.contains_key(key) {
            return None;
        }

        let press_time = self.millis(at);
        self.pending.insert(
            key.to_string(),
            PendingKeystroke::new(key, press_time, self.last_release),
        );
        None
    }

    fn on_key_up(&mut self, key: &str, at: Instant) -> Option<WireEvent> {
        if self.closed {
            return None;
        }
        if !self.is_visible() && !self.accepts_release_while_hidden() {
            return None;
        }

        let pending = self.pending.remove(key)?;
        let release_time = self.millis(at);
        self.last_release = release_time;

        let record = pending.complete(release_time);
        debug!(
            "keystroke {:?}: hold {:.1}ms, flight {:.1}ms",
            record.key, record.hold_time, record.flight_time
        );
        self.emit(record.into())
    }

    fn on_visibility_change(&mut self, visibility: Visibility, at: Instant) -> Option<WireEvent> {
        if self.closed || visibility == self.visibility {
            return None;
        }
        self.visibility = visibility;

        let event = match visibility {
            Visibility::Hidden => {
                if self.pending_on_hide == PendingOnHide::Discard && !self.pending.is_empty() {
                    debug!("hidden: discarding {} pending key(s)", self.pending.len());
                    self.pending.clear();
                }
                PageEvent::PageHidden
            }
            Visibility::Visible => PageEvent::PageVisible,
        };

        let record = VisibilityRecord {
            event,
            timestamp: self.millis(at),
        };
        self.emit(record.into())
    }
}

impl<T: TransportChannel> Drop for KeystrokeCapture<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, session_at};
    use crate::transport::{MemoryTransport, TransportStatus};
    use serde_json::json;

    #[test]
    fn press_and_release_emits_one_record() {
        let (mut capture, transport, origin) = session_at();

        assert_eq!(capture.on_key_down("a", at(origin, 100)), None);
        let emitted = capture.on_key_up("a", at(origin, 150));

        assert!(emitted.is_some());
        assert_eq!(
            transport.sent_json(),
            vec![json!([{
                "key": "a",
                "pressTime": 100.0,
                "holdTime": 50.0,
                "releaseTime": 150.0,
                "flightTime": 100.0
            }])]
        );
        assert_eq!(capture.pending_count(), 0);
    }

    #[test]
    fn repeated_press_keeps_first_timestamp() {
        let (mut capture, _transport, origin) = session_at();

        capture.on_key_down("a", at(origin, 100));
        capture.on_key_down("a", at(origin, 130));
        capture.on_key_down("a", at(origin, 160));

        assert_eq!(capture.pending_count(), 1);
        assert_eq!(capture.pending("a").unwrap().press_time, 100.0);

        let record = capture.on_key_up("a", at(origin, 200)).unwrap();
        assert_eq!(record.as_keystroke().unwrap().hold_time, 100.0);
    }

    #[test]
    fn flight_time_chains_from_previous_release() {
        let (mut capture, transport, origin) = session_at();

        capture.on_key_down("a", at(origin, 100));
        capture.on_key_up("a", at(origin, 150));
        capture.on_key_down("b", at(origin, 210));
        capture.on_key_up("b", at(origin, 260));

        let sent = transport.sent_json();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0][0]["flightTime"], 100.0);
        assert_eq!(sent[1][0]["flightTime"], 60.0);
        assert_eq!(capture.last_release(), 260.0);
    }

    #[test]
    fn overlapping_keys_are_tracked_independently() {
        let (mut capture, transport, origin) = session_at();

        capture.on_key_down("Shift", at(origin, 10));
        capture.on_key_down("a", at(origin, 40));
        assert_eq!(capture.pending_keys(), vec!["Shift", "a"]);

        capture.on_key_up("a", at(origin, 90));
        capture.on_key_up("Shift", at(origin, 120));

        let sent = transport.sent_json();
        assert_eq!(sent[0][0]["key"], "a");
        assert_eq!(sent[0][0]["flightTime"], 40.0);
        assert_eq!(sent[1][0]["key"], "Shift");
        assert_eq!(sent[1][0]["holdTime"], 110.0);
        // Shift was pressed before "a" was released
        assert_eq!(sent[1][0]["flightTime"], 10.0);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let (mut capture, transport, origin) = session_at();

        assert_eq!(capture.on_key_up("z", at(origin, 50)), None);
        assert!(transport.sent().is_empty());
        assert_eq!(capture.last_release(), 0.0);
    }

    #[test]
    fn hiding_emits_page_hidden_and_ignores_keys() {
        let (mut capture, transport, origin) = session_at();

        capture.on_visibility_change(Visibility::Hidden, at(origin, 500));
        capture.on_key_down("a", at(origin, 510));
        capture.on_key_up("a", at(origin, 520));

        assert_eq!(
            transport.sent_json(),
            vec![json!([{"event": "page_hidden", "timestamp": 500.0}])]
        );
        assert_eq!(capture.pending_count(), 0);
    }

    #[test]
    fn returning_emits_page_visible() {
        let (mut capture, transport, origin) = session_at();

        capture.on_visibility_change(Visibility::Hidden, at(origin, 500));
        capture.on_visibility_change(Visibility::Visible, at(origin, 700));

        let sent = transport.sent_json();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], json!([{"event": "page_visible", "timestamp": 700.0}]));
        assert!(capture.is_visible());
    }

    #[test]
    fn repeated_visibility_state_is_not_a_transition() {
        let (mut capture, transport, origin) = session_at();

        assert_eq!(capture.on_visibility_change(Visibility::Visible, at(origin, 5)), None);
        capture.on_visibility_change(Visibility::Hidden, at(origin, 10));
        assert_eq!(capture.on_visibility_change(Visibility::Hidden, at(origin, 20)), None);

        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn discard_policy_drops_held_keys_on_hide() {
        let (mut capture, transport, origin) = session_at();

        capture.on_key_down("a", at(origin, 100));
        capture.on_visibility_change(Visibility::Hidden, at(origin, 120));
        capture.on_visibility_change(Visibility::Visible, at(origin, 300));
        capture.on_key_up("a", at(origin, 310));

        assert_eq!(capture.pending_count(), 0);
        // Only the two visibility records
        assert_eq!(transport.sent().len(), 2);

        // Next key is not skewed by the discarded press
        capture.on_key_down("a", at(origin, 400));
        let record = capture.on_key_up("a", at(origin, 450)).unwrap();
        assert_eq!(record.as_keystroke().unwrap().flight_time, 400.0);
    }

    #[test]
    fn accept_release_policy_completes_held_keys_while_hidden() {
        let (capture, transport, origin) = session_at();
        let mut capture = capture.with_pending_on_hide(PendingOnHide::AcceptRelease);

        capture.on_key_down("a", at(origin, 100));
        capture.on_visibility_change(Visibility::Hidden, at(origin, 120));
        capture.on_key_down("b", at(origin, 130));
        let record = capture.on_key_up("a", at(origin, 150)).unwrap();

        assert_eq!(record.as_keystroke().unwrap().hold_time, 50.0);
        assert_eq!(capture.pending("b"), None);
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn keep_policy_leaves_stale_keys_pending() {
        let (capture, transport, origin) = session_at();
        let mut capture = capture.with_pending_on_hide(PendingOnHide::Keep);

        capture.on_key_down("a", at(origin, 100));
        capture.on_visibility_change(Visibility::Hidden, at(origin, 120));
        capture.on_key_up("a", at(origin, 150));

        assert_eq!(capture.pending("a").unwrap().press_time, 100.0);
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn sends_while_closed_are_dropped_by_transport() {
        let transport = MemoryTransport::new();
        let origin = Instant::now();
        let mut capture = KeystrokeCapture::new(transport.clone(), origin);

        capture.on_visibility_change(Visibility::Hidden, at(origin, 10));
        capture.on_visibility_change(Visibility::Visible, at(origin, 20));

        assert!(transport.sent().is_empty());
        assert_eq!(transport.dropped(), 2);
        assert!(capture.is_visible());
    }

    #[test]
    fn pump_status_forwards_text_verbatim() {
        let (capture, transport, _origin) = session_at();
        transport.push_status(TransportStatus::Message("Received 1 events".into()));

        let mut sink = String::new();
        assert_eq!(capture.pump_status(&mut sink), 2);
        assert_eq!(sink, "Received 1 events");
        assert_eq!(capture.pump_status(&mut sink), 0);
    }

    #[test]
    fn close_drops_pending_and_ignores_later_events() {
        let (mut capture, transport, origin) = session_at();

        capture.on_key_down("a", at(origin, 100));
        capture.close();

        assert!(capture.is_closed());
        assert!(!transport.is_open());
        assert_eq!(capture.pending_count(), 0);
        assert_eq!(capture.on_key_up("a", at(origin, 150)), None);
        assert_eq!(capture.on_visibility_change(Visibility::Hidden, at(origin, 160)), None);
    }

    #[test]
    fn events_before_origin_clamp_to_zero() {
        let origin = Instant::now() + std::time::Duration::from_secs(1);
        let capture = KeystrokeCapture::new(MemoryTransport::opened(), origin);
        assert_eq!(capture.millis(Instant::now()), 0.0);
    }

    #[test]
    fn on_key_event_dispatches_by_type() {
        let (mut capture, transport, origin) = session_at();

        capture.on_key_event(&KeyEvent::new("x", KeyEventType::Press, at(origin, 5)));
        capture.on_key_event(&KeyEvent::new("x", KeyEventType::Release, at(origin, 25)));

        assert_eq!(transport.sent_json()[0][0]["holdTime"], 20.0);
    }
}
