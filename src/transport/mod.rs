//! Transport channel to the collecting server
//!
//! The capture session only needs fire-and-forget sends plus a stream of
//! status notifications. [`WebSocketTransport`] talks to a real server;
//! [`MemoryTransport`] keeps everything in process.

mod memory;
mod websocket;

pub use memory::MemoryTransport;
pub use websocket::WebSocketTransport;

use log::Level;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Error type for transport setup
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Endpoint has no host")]
    MissingHost,
}

/// Notification delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// Connection established
    Opened,
    /// Connection closed, by either side or after a failed connect
    Closed,
    /// Connection failed or broke
    Error(String),
    /// Text sent by the server
    Message(String),
}

impl TransportStatus {
    /// Text shown in the status display
    pub fn text(&self) -> String {
        match self {
            Self::Opened => "Connected to server".to_string(),
            Self::Closed => "Disconnected from server".to_string(),
            Self::Error(e) => format!("Connection error: {}", e),
            Self::Message(text) => text.clone(),
        }
    }

    /// Level for the log line; server text arrives once per record
    pub fn log_level(&self) -> Level {
        match self {
            Self::Opened | Self::Closed => Level::Info,
            Self::Error(_) => Level::Warn,
            Self::Message(_) => Level::Debug,
        }
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Persistent, ordered, message-oriented connection
pub trait TransportChannel {
    /// Queue a message. Dropped silently when the channel is not open.
    fn send(&self, message: String);

    /// Next pending status notification, if any
    fn try_recv_status(&self) -> Option<TransportStatus>;

    /// Whether sends are currently delivered
    fn is_open(&self) -> bool;

    /// Close the connection; later sends are dropped
    fn close(&mut self);
}

impl<T: TransportChannel + ?Sized> TransportChannel for Box<T> {
    fn send(&self, message: String) {
        (**self).send(message)
    }

    fn try_recv_status(&self) -> Option<TransportStatus> {
        (**self).try_recv_status()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// WebSocket endpoint address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Build `ws://<host>/<path>`
    pub fn from_host(host: &str, path: &str) -> Result<Self, TransportError> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(TransportError::MissingHost);
        }
        let raw = format!("ws://{}/{}", host, path.trim_start_matches('/'));
        Self::parse(&raw)
    }

    /// Parse a full endpoint URL. Only plain `ws://` is accepted; the
    /// WebSocket client is built without a TLS backend.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let url = Url::parse(raw)?;
        if url.scheme() != "ws" {
            return Err(TransportError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(TransportError::MissingHost);
        }
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_host_and_path() {
        let endpoint = Endpoint::from_host("localhost:8000", "/ws").unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost:8000/ws");
    }

    #[test]
    fn endpoint_path_without_leading_slash() {
        let endpoint = Endpoint::from_host("example.com", "ws").unwrap();
        assert_eq!(endpoint.to_string(), "ws://example.com/ws");
    }

    #[test]
    fn endpoint_rejects_wss() {
        // No TLS backend, so a wss endpoint could never connect
        let err = Endpoint::parse("wss://example.com/ws").unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(s) if s == "wss"));
    }

    #[test]
    fn endpoint_rejects_http() {
        let err = Endpoint::parse("http://example.com/ws").unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(s) if s == "http"));
    }

    #[test]
    fn endpoint_rejects_empty_host() {
        assert!(matches!(
            Endpoint::from_host("  ", "/ws"),
            Err(TransportError::MissingHost)
        ));
    }

    #[test]
    fn server_text_logs_at_debug() {
        assert_eq!(
            TransportStatus::Message("Received 1 events".into()).log_level(),
            Level::Debug
        );
        assert_eq!(TransportStatus::Opened.log_level(), Level::Info);
        assert_eq!(TransportStatus::Closed.log_level(), Level::Info);
        assert_eq!(TransportStatus::Error("refused".into()).log_level(), Level::Warn);
    }

    #[test]
    fn status_text_for_connection_events() {
        assert_eq!(TransportStatus::Opened.text(), "Connected to server");
        assert_eq!(TransportStatus::Closed.text(), "Disconnected from server");
        assert_eq!(
            TransportStatus::Message("Received 1 events".into()).to_string(),
            "Received 1 events"
        );
        assert!(TransportStatus::Error("refused".into())
            .text()
            .contains("refused"));
    }
}
