//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! file of the servo control binary.
//!
//! # Usage
//!
//! ```rust,no_run
//! use servo_common::config::{load_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_config(Path::new("config.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::DEFAULT_SERVICE_NAME;
use crate::control::ControlConfig;
use crate::hal::config::{validate_actuators, ActuatorConfig, BusConfig, StartupConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

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
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// Common configuration fields (`[shared]`).
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "servo-control-bench"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Complete configuration of the servo control binary.
///
/// Every section is optional; an empty file yields the reference
/// deployment (two coupled actuators on ids 1 and 2, stepped actuator 0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServoConfig {
    /// Logging and identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Transport selection.
    #[serde(default)]
    pub bus: BusConfig,

    /// Startup register values.
    #[serde(default)]
    pub startup: StartupConfig,

    /// Actuators on the bus.
    #[serde(default = "ActuatorConfig::default_set")]
    pub actuators: Vec<ActuatorConfig>,

    /// Input mapping and loop pacing.
    #[serde(default)]
    pub control: ControlConfig,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            bus: BusConfig::default(),
            startup: StartupConfig::default(),
            actuators: ActuatorConfig::default_set(),
            control: ControlConfig::default(),
        }
    }
}

impl ServoConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.bus.validate()?;
        validate_actuators(&self.actuators)?;
        self.control.validate()?;
        Ok(())
    }
}

/// Load and validate a [`ServoConfig`] from a TOML file.
pub fn load_config(path: &Path) -> Result<ServoConfig, ConfigError> {
    let config = ServoConfig::load(path)?;
    config.validate()?;
    Ok(config)
}
