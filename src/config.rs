//! Configuration management for Keystroke Stream
//!
//! Configuration is read from a platform-specific TOML file. A missing file
//! means defaults; a malformed one is an error.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/keystroke-stream/config.toml` |
//! | macOS | `~/Library/Application Support/keystroke-stream/config.toml` |
//! | Windows | `%APPDATA%\keystroke-stream\config.toml` |
//!
//! The server host can also be set with the `KEYSTROKE_STREAM_HOST`
//! environment variable, which wins over the file.
//!
//! ## Example
//!
//! ```no_run
//! use keystroke_stream::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.server.host = "collector.local:8000".to_string();
//! config.save().expect("Failed to save config");
//! ```

use crate::capture::PendingOnHide;
use crate::transport::{Endpoint, TransportError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `server.host`
pub const HOST_ENV_VAR: &str = "KEYSTROKE_STREAM_HOST";

const APP_DIR: &str = "keystroke-stream";

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join(APP_DIR);

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Directory for logs and exported reports, created on demand
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_local_dir().ok_or(ConfigError::NoConfigDir)?;
    let dir = base.join(APP_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Collecting server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Capture behavior
    #[serde(default)]
    pub capture: CaptureConfig,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
    /// Session report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Collecting server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host and optional port, e.g. `localhost:8000`
    pub host: String,
    /// WebSocket path on the host
    pub path: String,
    /// Keep events in process instead of connecting
    #[serde(default)]
    pub offline: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8000".to_string(),
            path: "/ws".to_string(),
            offline: false,
        }
    }
}

/// Capture configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Handling of keys still held when the window loses focus
    #[serde(default)]
    pub pending_on_hide: PendingOnHide,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Refresh rate for UI updates (in Hz)
    pub refresh_rate_hz: u32,
    /// Number of recent records kept for display
    pub recent_records: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 60,
            recent_records: 50,
        }
    }
}

/// Session report configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write a JSON report when the application exits
    pub export_on_exit: bool,
    /// Where reports go; the platform data directory when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_host_override(std::env::var(HOST_ENV_VAR).ok());
        self
    }

    fn apply_host_override(&mut self, host: Option<String>) {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
    }

    /// WebSocket endpoint built from the server section
    pub fn endpoint(&self) -> Result<Endpoint, TransportError> {
        Endpoint::from_host(&self.server.host, &self.server.path)
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.ui.refresh_rate_hz.max(1) as u64)
    }

    /// Directory for exported reports
    pub fn report_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.report.directory {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path() -> PathBuf {
        env::temp_dir().join(format!("keystroke-stream-test-{}.toml", std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "localhost:8000");
        assert_eq!(config.server.path, "/ws");
        assert!(!config.server.offline);
        assert_eq!(config.capture.pending_on_hide, PendingOnHide::Discard);
        assert_eq!(config.ui.refresh_rate_hz, 60);
        assert_eq!(config.ui.recent_records, 50);
        assert!(!config.report.export_on_exit);
    }

    #[test]
    fn config_default_endpoint() {
        let endpoint = Config::default().endpoint().unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost:8000/ws");
    }

    #[test]
    fn config_refresh_interval() {
        let config = Config::default();
        // 60 Hz = 16666 microseconds per frame
        assert_eq!(config.refresh_interval().as_micros(), 16666);
    }

    #[test]
    fn config_refresh_interval_zero_rate() {
        let mut config = Config::default();
        config.ui.refresh_rate_hz = 0;
        assert_eq!(config.refresh_interval().as_secs(), 1);
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path();

        let mut config = Config::default();
        config.server.host = "collector:9000".to_string();
        config.capture.pending_on_hide = PendingOnHide::AcceptRelease;

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");

        assert_eq!(loaded.server.host, "collector:9000");
        assert_eq!(loaded.capture.pending_on_hide, PendingOnHide::AcceptRelease);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_deserializes_partial_toml() {
        let toml_str = r#"
[server]
host = "example.org"
path = "/keystrokes"

[capture]
pending_on_hide = "keep"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");

        assert_eq!(config.capture.pending_on_hide, PendingOnHide::Keep);
        assert_eq!(config.ui.refresh_rate_hz, 60);
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "ws://example.org/keystrokes"
        );
    }

    #[test]
    fn config_rejects_unknown_policy() {
        let toml_str = r#"
[capture]
pending_on_hide = "flush"
"#;
        let result: Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn config_serializes_sections() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[capture]"));
        assert!(toml_str.contains("pending_on_hide = \"discard\""));
    }

    #[test]
    fn host_override_replaces_host() {
        let mut config = Config::default();
        config.apply_host_override(Some("10.0.0.2:8000".to_string()));
        assert_eq!(config.server.host, "10.0.0.2:8000");
    }

    #[test]
    fn blank_host_override_is_ignored() {
        let mut config = Config::default();
        config.apply_host_override(Some("  ".to_string()));
        config.apply_host_override(None);
        assert_eq!(config.server.host, "localhost:8000");
    }

    #[test]
    fn report_dir_prefers_configured_directory() {
        let mut config = Config::default();
        config.report.directory = Some(PathBuf::from("/tmp/reports"));
        assert_eq!(config.report_dir().unwrap(), PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }
}
