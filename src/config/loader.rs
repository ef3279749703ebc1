//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "TTYLINE";

/// Config file name
const CONFIG_FILE_NAME: &str = "ttyline.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "TTYLINE_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `TTYLINE_CONFIG` environment variable (explicit path)
    /// 2. `./ttyline.toml` (current directory)
    /// 3. platform config dir (`~/.config/ttyline/ttyline.toml` on Linux)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Env overrides apply even without a file.
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Resolve the config file path using the standard search order.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        if !explicit.is_empty() {
            return Some(PathBuf::from(explicit));
        }
    }

    let cwd_candidate = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_candidate.exists() {
        return Some(cwd_candidate);
    }

    if let Some(dir) = get_default_config_dir() {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

/// Platform config directory for this crate, if one can be determined.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ttyline")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Apply `TTYLINE_<SECTION>_<KEY>` environment overrides.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(path) = env_string("DEVICE_PATH") {
        config.device.path = Some(path);
    }
    if let Some(value) = env_string("DEVICE_BAUD") {
        config.device.baud = Some(parse_env("DEVICE_BAUD", &value)?);
    }
    if let Some(mode) = env_string("DEVICE_OPEN_MODE") {
        config.device.open_mode = mode;
    }
    if let Some(value) = env_string("IO_SEND_WAIT_MS") {
        config.io.send_wait_ms = parse_env("IO_SEND_WAIT_MS", &value)?;
    }
    if let Some(value) = env_string("IO_READ_COUNT") {
        config.io.read_count = Some(parse_env("IO_READ_COUNT", &value)?);
    }
    if let Some(value) = env_string("IO_FILTER_ECHO") {
        config.io.filter_echo = parse_env("IO_FILTER_ECHO", &value)?;
    }
    if let Some(level) = env_string("LOGGING_LEVEL") {
        config.logging.level = level;
    }
    Ok(())
}

fn env_string(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{suffix}"))
        .ok()
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(suffix: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| {
        ConfigError::env_parse(format!("{ENV_PREFIX}_{suffix}"), e.to_string())
    })
}
