//! Startup configuration.
//!
//! Loaded once from a JSON file at process start. The schema is
//! strict: unknown keys are rejected and a missing required key is a
//! fatal startup error, surfaced before any monitor is created.

use std::path::Path;

use serde::Deserialize;

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for configuration loading failures. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON or violates the schema.
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// One camera device entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Configuration key for the camera, e.g. `"back_door"`. Also the
    /// fallback display name if the device does not report one.
    pub name: String,
    /// Device address.
    pub ip: String,
    /// Device HTTP API port.
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Appended to the callback host path to form this camera's
    /// callback URL.
    pub callback_suffix: String,
}

impl CameraConfig {
    /// Base URL of the device HTTP API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }
}

/// SMTP endpoint, credentials, and recipients.
///
/// The `user` address doubles as the sender address.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    pub server: String,
    /// Submission port; defaults to 587 (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub recipients: Vec<String>,
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

/// Callback host ("NAS") settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NasConfig {
    pub ip: String,
    pub port: u16,
    /// Path prefix of the surveillance-station webhook endpoint.
    pub surveillance_station_path: String,
}

/// Root configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub cameras: Vec<CameraConfig>,
    pub smtp: SmtpConfig,
    pub nas: NasConfig,
}

impl Config {
    /// Load and validate the configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Compose the outbound callback URL for one camera.
    pub fn callback_url(&self, camera: &CameraConfig) -> String {
        format!(
            "http://{}:{}{}{}",
            self.nas.ip, self.nas.port, self.nas.surveillance_station_path, camera.callback_suffix
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
