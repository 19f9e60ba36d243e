//! Main application state and logic

use super::widgets::{EntryStatus, SummaryEntry};
use crate::capture::{CaptureHandler, KeystrokeCapture, Visibility, WireEvent};
use crate::config::Config;
use crate::keyboard::KeyEvent;
use crate::report::{report_file_name, SessionReport, TypingStats};
use crate::status::StatusSink;
use crate::transport::TransportChannel;
use log::{debug, info};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Capture,
    Help,
}

impl AppView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Capture => "Capture",
            Self::Help => "Help",
        }
    }
}

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Status line fed by the transport and by local actions
#[derive(Debug, Default)]
pub struct StatusLine {
    text: String,
    updated: Option<Instant>,
}

impl StatusLine {
    pub fn text(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }

    pub fn updated(&self) -> Option<Instant> {
        self.updated
    }
}

impl StatusSink for StatusLine {
    fn set_text(&mut self, text: &str) {
        self.text.set_text(text);
        self.updated = Some(Instant::now());
    }
}

/// Main application
pub struct App<T: TransportChannel> {
    /// Current view
    pub view: AppView,
    /// Application state
    pub state: AppState,
    /// Configuration
    pub config: Config,
    /// Capture session
    pub capture: KeystrokeCapture<T>,
    /// Statistics over emitted events
    pub stats: TypingStats,
    /// Most recent emitted events, newest first
    pub recent: VecDeque<WireEvent>,
    /// Status display
    pub status: StatusLine,
    /// Endpoint the session streams to
    pub endpoint: String,
    /// Application start time
    pub start_time: Instant,
    /// Total keyboard events seen, including ignored ones
    pub total_events: u64,
    /// When the window last became visible again
    visible_since: Option<Instant>,
}

impl<T: TransportChannel> App<T> {
    pub fn new(config: Config, capture: KeystrokeCapture<T>, endpoint: impl Into<String>) -> Self {
        let capacity = config.ui.recent_records;
        Self {
            view: AppView::Capture,
            state: AppState::Running,
            config,
            capture,
            stats: TypingStats::new(),
            recent: VecDeque::with_capacity(capacity),
            status: StatusLine::default(),
            endpoint: endpoint.into(),
            start_time: Instant::now(),
            total_events: 0,
            visible_since: None,
        }
    }

    /// Feed a keyboard event to the capture session
    pub fn process_event(&mut self, event: &KeyEvent) {
        if self.state != AppState::Running {
            return;
        }
        self.total_events += 1;
        // Typed in another window, delivered after focus came back
        if self.visible_since.is_some_and(|since| event.timestamp < since) {
            debug!("dropping {} from before focus returned", event.key);
            return;
        }
        if let Some(emitted) = self.capture.on_key_event(event) {
            self.track(emitted);
        }
    }

    /// Feed a focus change to the capture session
    pub fn set_visibility(&mut self, visibility: Visibility, at: Instant) {
        let was_visible = self.capture.is_visible();
        if let Some(emitted) = self.capture.on_visibility_change(visibility, at) {
            self.track(emitted);
        }
        if !was_visible && self.capture.is_visible() {
            self.visible_since = Some(at);
        }
    }

    fn track(&mut self, event: WireEvent) {
        self.stats.record(&event);
        if self.config.ui.recent_records == 0 {
            return;
        }
        self.recent.push_front(event);
        self.recent.truncate(self.config.ui.recent_records);
    }

    /// Move transport notifications into the status line
    pub fn pump_status(&mut self) -> usize {
        self.capture.pump_status(&mut self.status)
    }

    /// Set a local status message
    pub fn set_status(&mut self, message: &str) {
        info!("status: {}", message);
        self.status.set_text(message);
    }

    pub fn toggle_help(&mut self) {
        self.view = match self.view {
            AppView::Capture => AppView::Help,
            AppView::Help => AppView::Capture,
        };
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Clear statistics and the recent list; capture state is untouched
    pub fn reset_stats(&mut self) {
        self.stats.reset();
        self.recent.clear();
        self.total_events = 0;
        self.set_status("Statistics reset");
    }

    /// Close the capture session
    pub fn close(&mut self) {
        self.capture.close();
    }

    /// Summary lines for the capture view
    pub fn summary_entries(&self) -> Vec<SummaryEntry> {
        let mut entries = Vec::new();

        let (connection, status) = if self.capture.transport().is_open() {
            ("open", EntryStatus::Ok)
        } else {
            ("closed", EntryStatus::Warning)
        };
        entries.push(SummaryEntry::new(
            "Server",
            format!("{} ({})", self.endpoint, connection),
            status,
        ));

        let (visibility, status) = if self.capture.is_visible() {
            ("visible", EntryStatus::Ok)
        } else {
            ("hidden - capture paused", EntryStatus::Warning)
        };
        entries.push(SummaryEntry::new("Window", visibility, status));

        let held = self.capture.pending_keys();
        let held = if held.is_empty() {
            "-".to_string()
        } else {
            held.iter().map(|k| display_key(k)).collect::<Vec<_>>().join(" ")
        };
        entries.push(SummaryEntry::info("Held Keys", held));

        entries.push(SummaryEntry::info(
            "Keystrokes Sent",
            self.stats.keystrokes().to_string(),
        ));

        if let Some(avg) = self.stats.avg_hold_ms() {
            entries.push(SummaryEntry::info("Avg Hold", format!("{:.1} ms", avg)));
        }
        if let Some(avg) = self.stats.avg_flight_ms() {
            entries.push(SummaryEntry::info("Avg Flight", format!("{:.1} ms", avg)));
        }

        entries
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Generate a session report
    pub fn generate_report(&self) -> SessionReport {
        SessionReport::new(
            &self.stats,
            self.start_time.elapsed().as_secs_f64(),
            self.endpoint.clone(),
        )
    }

    /// Export session report as JSON into `dir`
    pub fn export_report(&mut self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(report_file_name());
        self.generate_report().export_json(&path)?;
        self.set_status(&format!("Exported to {}", path.display()));
        Ok(path)
    }
}

/// Printable form of a key identifier
pub fn display_key(key: &str) -> &str {
    match key {
        " " => "Space",
        other => other,
    }
}
