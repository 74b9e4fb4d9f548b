//! TOML configuration for the gridosc binary.
//!
//! ```toml
//! [serialosc]
//! host = "127.0.0.1"
//! port = 12002
//! bind_host = "127.0.0.1"
//!
//! [grid]
//! prefix = "gridosc"
//! log_level = "info"
//!
//! [pages]
//! count = 3
//! corner = "bottom-right"
//! ```
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = "...")]` helper, so a file only
//! needs the keys it changes and an empty file is a valid configuration.
//! A corner name outside the four known values fails to parse: a bad page
//! setup is reported at startup rather than when the first device appears.

use std::path::{Path, PathBuf};

use gridosc_core::{PageCorner, SERIALOSC_PORT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub serialosc: SerialoscConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub pages: PagesConfig,
}

/// Where the discovery service and devices live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialoscConfig {
    /// Host serialosc and every device listen on.
    #[serde(default = "default_host")]
    pub host: String,
    /// serialosc's well-known UDP port.
    #[serde(default = "default_serialosc_port")]
    pub port: u16,
    /// Local address our sockets bind to.  Each socket takes an ephemeral port.
    #[serde(default = "default_host")]
    pub bind_host: String,
}

/// Per-device settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    /// OSC prefix devices are told to use for key and tilt events.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Page multiplexing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PagesConfig {
    /// `0` runs one application per device; `N` shares each device between
    /// N applications.
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub corner: PageCorner,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_serialosc_port() -> u16 {
    SERIALOSC_PORT
}
fn default_prefix() -> String {
    "gridosc".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SerialoscConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_serialosc_port(),
            bind_host: default_host(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            log_level: default_log_level(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses `AppConfig` from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Writes `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
