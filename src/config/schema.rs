//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All sections are optional in the file; missing values fall back to the
//! defaults below.

use crate::baud;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device configuration
    pub device: DeviceConfig,
    /// Exchange tuning
    pub io: IoConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(rate) = self.device.baud {
            if !baud::is_supported(rate) {
                return Err(ConfigError::validation(
                    "device.baud",
                    format!("{rate} is not a supported baud rate"),
                ));
            }
        }
        if crate::mode::OpenMode::parse(&self.device.open_mode).is_none() {
            return Err(ConfigError::validation(
                "device.open_mode",
                format!("{:?} does not match the [raw]+?b? grammar", self.device.open_mode),
            ));
        }
        Ok(())
    }
}

/// Device configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device node to configure and open (e.g. "/dev/ttyUSB0")
    pub path: Option<String>,
    /// Baud rate to set after configuring; omitted = leave as-is
    pub baud: Option<u32>,
    /// fopen-style open mode token
    pub open_mode: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: None,
            baud: None,
            open_mode: "r+b".to_string(),
        }
    }
}

/// Exchange tuning section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Post-send delay in milliseconds
    pub send_wait_ms: u64,
    /// Byte count hint for reads; omitted = poll in small chunks
    pub read_count: Option<usize>,
    /// Remove the echoed command from responses
    pub filter_echo: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            send_wait_ms: 100,
            read_count: None,
            filter_echo: true,
        }
    }
}

impl IoConfig {
    /// Get the post-send delay as a Duration
    pub fn send_wait(&self) -> Duration {
        Duration::from_millis(self.send_wait_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output (default)
    #[default]
    Text,
    /// Machine-readable JSON lines
    Json,
}
