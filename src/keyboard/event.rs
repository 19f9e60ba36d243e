//! Keyboard event types and listener

use super::KeyCode;
use device_query::{DeviceQuery, DeviceState};
use std::sync::mpsc;
use std::time::Instant;

/// Type of keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    /// Key was pressed down
    Press,
    /// Key was released
    Release,
}

/// A keyboard event with timing information
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// Key identifier ("a", "Shift", "Enter", ...)
    pub key: String,
    /// Type of event (press/release)
    pub event_type: KeyEventType,
    /// When the event occurred
    pub timestamp: Instant,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, event_type: KeyEventType, timestamp: Instant) -> Self {
        Self {
            key: key.into(),
            event_type,
            timestamp,
        }
    }

    /// Build an event from a scancode, resolving its key identifier
    pub fn from_code(code: KeyCode, event_type: KeyEventType, timestamp: Instant) -> Self {
        Self::new(code.identifier(), event_type, timestamp)
    }

    pub fn is_press(&self) -> bool {
        self.event_type == KeyEventType::Press
    }
}

/// Keyboard listener that polls for key state changes
pub struct KeyboardListener {
    device_state: DeviceState,
    last_keys: Vec<device_query::Keycode>,
    event_tx: mpsc::Sender<KeyEvent>,
}

impl KeyboardListener {
    /// Create a new keyboard listener
    pub fn new(event_tx: mpsc::Sender<KeyEvent>) -> Self {
        Self {
            device_state: DeviceState::new(),
            last_keys: Vec::new(),
            event_tx,
        }
    }

    /// Poll for keyboard state changes
    /// Returns the number of events generated
    pub fn poll(&mut self) -> usize {
        let now = Instant::now();
        let current_keys = self.device_state.get_keys();
        let mut event_count = 0;

        // Releases first so a key swapped within one poll keeps down/up order
        for key in &self.last_keys {
            if !current_keys.contains(key) {
                let event = KeyEvent::from_code(KeyCode::from(*key), KeyEventType::Release, now);
                let _ = self.event_tx.send(event);
                event_count += 1;
            }
        }

        for key in &current_keys {
            if !self.last_keys.contains(key) {
                let event = KeyEvent::from_code(KeyCode::from(*key), KeyEventType::Press, now);
                let _ = self.event_tx.send(event);
                event_count += 1;
            }
        }

        self.last_keys = current_keys;
        event_count
    }
}
