//! Wire records emitted by the capture session

use serde::{Deserialize, Serialize};

/// Timing for a key that is currently held down
#[derive(Debug, Clone, PartialEq)]
pub struct PendingKeystroke {
    /// Key identifier
    pub key: String,
    /// Press time in session milliseconds
    pub press_time: f64,
    /// Release time, set when the matching key-up arrives
    pub release_time: Option<f64>,
    /// Release minus press, set together with `release_time`
    pub hold_duration: Option<f64>,
    /// Press time minus the previous completed release
    pub flight_time: f64,
}

impl PendingKeystroke {
    pub fn new(key: impl Into<String>, press_time: f64, last_release: f64) -> Self {
        Self {
            key: key.into(),
            press_time,
            release_time: None,
            hold_duration: None,
            flight_time: press_time - last_release,
        }
    }

    /// Fill in the release fields and produce the completed record
    pub fn complete(mut self, release_time: f64) -> KeystrokeRecord {
        let hold = release_time - self.press_time;
        self.release_time = Some(release_time);
        self.hold_duration = Some(hold);

        KeystrokeRecord {
            key: self.key,
            press_time: self.press_time,
            hold_time: hold,
            release_time,
            flight_time: self.flight_time,
        }
    }
}

/// One complete press-release cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystrokeRecord {
    pub key: String,
    pub press_time: f64,
    pub hold_time: f64,
    pub release_time: f64,
    pub flight_time: f64,
}

/// Visibility control event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageEvent {
    PageHidden,
    PageVisible,
}

impl PageEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageHidden => "page_hidden",
            Self::PageVisible => "page_visible",
        }
    }
}

/// Visibility transition control record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityRecord {
    pub event: PageEvent,
    pub timestamp: f64,
}

/// Anything the session writes to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEvent {
    Keystroke(KeystrokeRecord),
    Visibility(VisibilityRecord),
}

impl WireEvent {
    /// Serialize as a one-element JSON array, the framing the server expects
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&[self])
    }

    pub fn as_keystroke(&self) -> Option<&KeystrokeRecord> {
        match self {
            Self::Keystroke(record) => Some(record),
            Self::Visibility(_) => None,
        }
    }
}

impl From<KeystrokeRecord> for WireEvent {
    fn from(record: KeystrokeRecord) -> Self {
        Self::Keystroke(record)
    }
}

impl From<VisibilityRecord> for WireEvent {
    fn from(record: VisibilityRecord) -> Self {
        Self::Visibility(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn flight_time_is_measured_from_last_release() {
        let pending = PendingKeystroke::new("a", 300.0, 250.0);
        assert_eq!(pending.flight_time, 50.0);
        assert_eq!(pending.release_time, None);
        assert_eq!(pending.hold_duration, None);
    }

    #[test]
    fn complete_computes_hold_time() {
        let record = PendingKeystroke::new("a", 100.0, 0.0).complete(150.0);
        assert_eq!(record.hold_time, 50.0);
        assert_eq!(record.release_time, 150.0);
        assert_eq!(record.flight_time, 100.0);
    }

    #[test]
    fn keystroke_message_uses_camel_case_fields() {
        let event = WireEvent::from(PendingKeystroke::new("a", 100.0, 0.0).complete(150.0));
        let message = event.to_message().unwrap();

        assert_eq!(
            message,
            r#"[{"key":"a","pressTime":100.0,"holdTime":50.0,"releaseTime":150.0,"flightTime":100.0}]"#
        );
    }

    #[test]
    fn visibility_message_shape() {
        let event = WireEvent::from(VisibilityRecord {
            event: PageEvent::PageHidden,
            timestamp: 500.0,
        });
        let value: Value = serde_json::from_str(&event.to_message().unwrap()).unwrap();

        assert_eq!(value, json!([{"event": "page_hidden", "timestamp": 500.0}]));
    }

    #[test]
    fn untagged_decode_distinguishes_records() {
        let keystroke: WireEvent = serde_json::from_value(json!({
            "key": "b", "pressTime": 1.0, "holdTime": 2.0, "releaseTime": 3.0, "flightTime": 1.0
        }))
        .unwrap();
        assert!(keystroke.as_keystroke().is_some());

        let visibility: WireEvent =
            serde_json::from_value(json!({"event": "page_visible", "timestamp": 9.5})).unwrap();
        assert_eq!(
            visibility,
            WireEvent::Visibility(VisibilityRecord {
                event: PageEvent::PageVisible,
                timestamp: 9.5
            })
        );
    }

    #[test]
    fn page_event_names() {
        assert_eq!(PageEvent::PageHidden.as_str(), "page_hidden");
        assert_eq!(PageEvent::PageVisible.as_str(), "page_visible");
    }
}
