//! Session statistics and report export
//!
//! Statistics are computed only from events the capture session actually
//! emitted, so they describe exactly what the server was sent.

use crate::capture::{PageEvent, WireEvent};
use crate::utils::MinMaxExt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const BACKSPACE: &str = "Backspace";

/// Running statistics over emitted events
#[derive(Debug, Clone, Default)]
pub struct TypingStats {
    keystrokes: u64,
    backspaces: u64,
    hidden_transitions: u64,
    visible_transitions: u64,
    total_hold_ms: f64,
    total_flight_ms: f64,
    min_hold_ms: Option<f64>,
    max_hold_ms: Option<f64>,
    key_frequency: HashMap<String, u64>,
}

impl TypingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one emitted event
    pub fn record(&mut self, event: &WireEvent) {
        match event {
            WireEvent::Keystroke(record) => {
                self.keystrokes += 1;
                if record.key == BACKSPACE {
                    self.backspaces += 1;
                }
                self.total_hold_ms += record.hold_time;
                self.total_flight_ms += record.flight_time;
                self.min_hold_ms.update_min(record.hold_time);
                self.max_hold_ms.update_max(record.hold_time);
                *self.key_frequency.entry(record.key.clone()).or_insert(0) += 1;
            }
            WireEvent::Visibility(record) => match record.event {
                PageEvent::PageHidden => self.hidden_transitions += 1,
                PageEvent::PageVisible => self.visible_transitions += 1,
            },
        }
    }

    pub fn keystrokes(&self) -> u64 {
        self.keystrokes
    }

    pub fn backspaces(&self) -> u64 {
        self.backspaces
    }

    pub fn hidden_transitions(&self) -> u64 {
        self.hidden_transitions
    }

    pub fn visible_transitions(&self) -> u64 {
        self.visible_transitions
    }

    pub fn avg_hold_ms(&self) -> Option<f64> {
        (self.keystrokes > 0).then(|| self.total_hold_ms / self.keystrokes as f64)
    }

    pub fn avg_flight_ms(&self) -> Option<f64> {
        (self.keystrokes > 0).then(|| self.total_flight_ms / self.keystrokes as f64)
    }

    pub fn min_hold_ms(&self) -> Option<f64> {
        self.min_hold_ms
    }

    pub fn max_hold_ms(&self) -> Option<f64> {
        self.max_hold_ms
    }

    /// Backspaces per keystroke
    pub fn error_rate(&self) -> f64 {
        if self.keystrokes == 0 {
            0.0
        } else {
            self.backspaces as f64 / self.keystrokes as f64
        }
    }

    /// Keystrokes per second over `elapsed_secs`
    pub fn keys_per_second(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            self.keystrokes as f64 / elapsed_secs
        } else {
            0.0
        }
    }

    /// Most frequently released key; ties go to the lexically smallest key
    pub fn most_frequent_key(&self) -> Option<&str> {
        self.key_frequency
            .iter()
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
            .map(|(key, _)| key.as_str())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Complete session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub metadata: ReportMetadata,
    pub summary: SessionSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Session duration in seconds
    pub duration_secs: f64,
    /// Server the session streamed to
    pub endpoint: String,
}

/// Session summary statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub keystrokes: u64,
    pub backspaces: u64,
    pub error_rate: f64,
    pub keys_per_second: f64,
    pub avg_hold_ms: Option<f64>,
    pub min_hold_ms: Option<f64>,
    pub max_hold_ms: Option<f64>,
    pub avg_flight_ms: Option<f64>,
    pub most_frequent_key: Option<String>,
    pub page_hidden_count: u64,
    pub page_visible_count: u64,
}

impl SessionReport {
    pub fn new(stats: &TypingStats, duration_secs: f64, endpoint: impl Into<String>) -> Self {
        let now: DateTime<Utc> = Utc::now();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                duration_secs,
                endpoint: endpoint.into(),
            },
            summary: SessionSummary {
                keystrokes: stats.keystrokes(),
                backspaces: stats.backspaces(),
                error_rate: stats.error_rate(),
                keys_per_second: stats.keys_per_second(duration_secs),
                avg_hold_ms: stats.avg_hold_ms(),
                min_hold_ms: stats.min_hold_ms(),
                max_hold_ms: stats.max_hold_ms(),
                avg_flight_ms: stats.avg_flight_ms(),
                most_frequent_key: stats.most_frequent_key().map(str::to_string),
                page_hidden_count: stats.hidden_transitions(),
                page_visible_count: stats.visible_transitions(),
            },
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Default report file name for the current time
pub fn report_file_name() -> String {
    format!(
        "keystroke_report_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}
