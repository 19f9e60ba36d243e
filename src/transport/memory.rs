//! In-process transport

use super::{TransportChannel, TransportStatus};
use log::debug;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    sent: Vec<String>,
    dropped: usize,
    statuses: VecDeque<TransportStatus>,
}

/// Transport that records messages instead of sending them.
///
/// Clones share the same state, so a handle kept outside the capture session
/// can inspect what was sent and inject server notifications.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// Create a closed transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that is already open
    pub fn opened() -> Self {
        let transport = Self::new();
        transport.set_open(true);
        transport
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open or close the channel, queueing the matching notification
    pub fn set_open(&self, open: bool) {
        let mut state = self.lock();
        if state.open == open {
            return;
        }
        state.open = open;
        let status = if open {
            TransportStatus::Opened
        } else {
            TransportStatus::Closed
        };
        state.statuses.push_back(status);
    }

    /// Queue a notification as if it came from the server
    pub fn push_status(&self, status: TransportStatus) {
        self.lock().statuses.push_back(status);
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Messages delivered so far, parsed as JSON
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.lock()
            .sent
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// Number of messages dropped because the channel was closed
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }
}

impl TransportChannel for MemoryTransport {
    fn send(&self, message: String) {
        let mut state = self.lock();
        if state.open {
            debug!("memory transport: {}", message);
            state.sent.push(message);
        } else {
            state.dropped += 1;
        }
    }

    fn try_recv_status(&self) -> Option<TransportStatus> {
        self.lock().statuses.pop_front()
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn close(&mut self) {
        self.set_open(false);
    }
}
