//! Configuration loading traits and types.
//!
//! Every OVL configuration file is TOML. Any `serde`-deserializable type can
//! be loaded through [`ConfigLoader`]; [`HostConfig`] is the top-level file
//! read by the `ovl_hal` binary.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ovl_common::config::{ConfigError, HostConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = HostConfig::load_validated(Path::new("host.toml"))?;
//!     println!("Backend: {}", config.backend.kind);
//!     Ok(())
//! }
//! ```

use crate::hal::config::{BackendConfig, OverlayManifest};
use crate::hal::consts::HOST_SERVICE_NAME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-register access tracing.
    Trace,
    /// Window mapping and region lookups.
    Debug,
    /// Overlay lifecycle.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Equivalent `tracing` level.
    pub const fn as_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields (`[shared]` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    HOST_SERVICE_NAME.to_string()
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if the file cannot be read or parsed
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::ParseError(format!("{}: {e}", path.display()))
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Top-level host configuration (`host.toml`).
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "ovl-host"
///
/// [backend]
/// kind = "simulation"
///
/// [overlay]
/// image = "qick_top.bit"
///
/// [overlay.regions.axi_gpio]
/// base = 0x4120_0000
/// length = 0x1000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Logging and identity.
    pub shared: SharedConfig,

    /// Backend selection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Overlay to load.
    pub overlay: OverlayManifest,
}

impl HostConfig {
    /// Load and validate a host configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - the overlay image is empty or a region has zero length
    /// - a region name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        if self.overlay.regions.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "region names cannot be empty".to_string(),
            ));
        }
        self.overlay
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
