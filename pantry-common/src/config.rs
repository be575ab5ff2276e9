//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file at the default location is not an error: compiled
//! defaults are used and [`Settings::source`] records it, so the caller can
//! warn once its subscriber is installed. A config path given explicitly (CLI
//! or `PANTRY_CONFIG`) must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the remote API base URL
pub const ENV_API_URL: &str = "PANTRY_API_URL";

/// Environment variable naming the TOML config file
pub const ENV_CONFIG_PATH: &str = "PANTRY_CONFIG";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_QUANTITY: &str = "1";

/// Contents of the TOML config file
///
/// Every field is optional so partial files are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the pantry API (scan, list, create, delete)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Quantity used when a draft does not specify one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_quantity: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
}

impl ConfigOverrides {
    /// Config file these overrides point at: the explicit path, else the
    /// platform default
    pub fn config_file(&self) -> Option<PathBuf> {
        match config_path(self) {
            ConfigLocation::Explicit(path) => Some(path),
            ConfigLocation::Default(path) => path,
        }
    }
}

/// Where the file layer of [`Settings`] came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file at the default location (`None`: no config dir on this platform)
    Missing(Option<PathBuf>),
    /// Assembled in code, no file consulted
    #[default]
    Defaults,
}

impl ConfigSource {
    /// Report the source; call after the tracing subscriber is installed
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                info!("Loaded TOML configuration from {}", path.display())
            }
            ConfigSource::Missing(Some(path)) => warn!(
                "No config file found at {}, using built-in defaults",
                path.display()
            ),
            ConfigSource::Missing(None) => {
                warn!("No config directory on this platform, using built-in defaults")
            }
            ConfigSource::Defaults => debug!("Using built-in configuration defaults"),
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL without trailing slash
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub default_quantity: String,
    pub logging: LoggingConfig,
    pub source: ConfigSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_quantity: DEFAULT_QUANTITY.to_string(),
            logging: LoggingConfig::default(),
            source: ConfigSource::Defaults,
        }
    }
}

impl Settings {
    /// Resolve settings from CLI overrides, environment, TOML file and defaults
    ///
    /// Nothing is logged here; resolution runs before logging is configured.
    /// Call [`ConfigSource::log`] on `source` afterwards.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let (toml_config, source) = match config_path(overrides) {
            ConfigLocation::Explicit(path) => (load_toml_config(&path)?, ConfigSource::File(path)),
            ConfigLocation::Default(Some(path)) if path.exists() => {
                (load_toml_config(&path)?, ConfigSource::File(path))
            }
            ConfigLocation::Default(path) => (TomlConfig::default(), ConfigSource::Missing(path)),
        };

        let env_url = std::env::var(ENV_API_URL).ok().filter(|v| !v.trim().is_empty());
        let mut settings = Self::from_sources(overrides.api_base_url.clone(), env_url, toml_config)?;
        settings.source = source;
        Ok(settings)
    }

    /// Merge already-gathered sources; highest priority first
    pub fn from_sources(
        cli_url: Option<String>,
        env_url: Option<String>,
        toml_config: TomlConfig,
    ) -> Result<Self> {
        let api_base_url = cli_url
            .or(env_url)
            .or(toml_config.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs = toml_config
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let default_quantity = toml_config
            .default_quantity
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| DEFAULT_QUANTITY.to_string());

        Ok(Self {
            api_base_url: normalize_base_url(&api_base_url)?,
            request_timeout: Duration::from_secs(timeout_secs),
            default_quantity,
            logging: toml_config.logging,
            source: ConfigSource::Defaults,
        })
    }
}

enum ConfigLocation {
    Explicit(PathBuf),
    Default(Option<PathBuf>),
}

fn config_path(overrides: &ConfigOverrides) -> ConfigLocation {
    if let Some(path) = &overrides.config_path {
        return ConfigLocation::Explicit(path.clone());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return ConfigLocation::Explicit(PathBuf::from(path));
        }
    }
    ConfigLocation::Default(default_config_path())
}

/// Platform config file location: `<config_dir>/pantry/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pantry").join("config.toml"))
}

/// Validate and strip the trailing slash from a base URL
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must start with http:// or https://, got {:?}",
            url
        )));
    }
    Ok(trimmed.to_string())
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e)))?;
    Ok(config)
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
