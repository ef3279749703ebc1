//! Configuration module for ttyline.
//!
//! This module provides TOML-based configuration with environment variable
//! overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of
//! priority):
//!
//! 1. `TTYLINE_CONFIG` environment variable (explicit path)
//! 2. `./ttyline.toml` (current directory)
//! 3. platform config dir (`~/.config/ttyline/ttyline.toml` on Linux)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `TTYLINE_<SECTION>_<KEY>`
//!
//! Examples:
//! - `TTYLINE_DEVICE_PATH=/dev/ttyUSB0`
//! - `TTYLINE_DEVICE_BAUD=9600`
//! - `TTYLINE_IO_SEND_WAIT_MS=250`

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_dir, resolve_config_path, ConfigLoader};
pub use schema::{Config, DeviceConfig, IoConfig, LogFormat, LoggingConfig};
