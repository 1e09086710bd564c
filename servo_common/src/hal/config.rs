//! Bus and actuator configuration types.
//!
//! - `BusConfig` - Transport driver selection and serial parameters
//! - `StartupConfig` - Fixed configuration sequence values
//! - `ActuatorConfig` - Per-actuator identity and control role

use crate::config::ConfigError;
use crate::hal::consts::{
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE, DEFAULT_LEFT_ID, DEFAULT_PROFILE_ACCELERATION,
    DEFAULT_PROFILE_VELOCITY, DEFAULT_READ_TIMEOUT_MS, DEFAULT_RIGHT_ID, DEFAULT_STEPPED_ID,
    MAX_ACTUATOR_ID, PROTOCOL_VERSION,
};
use crate::hal::registers::OperatingMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_driver() -> String {
    "serial".to_string()
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_protocol_version() -> f32 {
    PROTOCOL_VERSION
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_profile_velocity() -> u32 {
    DEFAULT_PROFILE_VELOCITY
}

fn default_profile_acceleration() -> u32 {
    DEFAULT_PROFILE_ACCELERATION
}

/// Transport selection and serial parameters (`[bus]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusConfig {
    /// Transport driver name ("serial" or "simulation").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Serial device path of the bus adapter.
    #[serde(default = "default_device")]
    pub device: String,

    /// Bus speed in bits per second.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Wire protocol version; only 2.0 is spoken.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: f32,

    /// Timeout waiting for one status packet.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            device: default_device(),
            baud_rate: default_baud_rate(),
            protocol_version: default_protocol_version(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl BusConfig {
    /// Validate the bus configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "bus.driver cannot be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "bus.baud_rate must be greater than 0".to_string(),
            ));
        }
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ConfigError::ValidationError(format!(
                "bus.protocol_version {} not supported (only {:.1})",
                self.protocol_version, PROTOCOL_VERSION
            )));
        }
        Ok(())
    }
}

/// Values written by the fixed startup sequence (`[startup]`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartupConfig {
    /// Operating mode written while torque is off.
    #[serde(default)]
    pub operating_mode: OperatingMode,

    /// Profile velocity register value.
    #[serde(default = "default_profile_velocity")]
    pub profile_velocity: u32,

    /// Profile acceleration register value.
    #[serde(default = "default_profile_acceleration")]
    pub profile_acceleration: u32,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            operating_mode: OperatingMode::ExtendedPosition,
            profile_velocity: DEFAULT_PROFILE_VELOCITY,
            profile_acceleration: DEFAULT_PROFILE_ACCELERATION,
        }
    }
}

/// How the control loop drives an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorRole {
    /// Follows the continuous axis together with every other coupled actuator.
    Coupled,
    /// Stepped by the decrement/increment buttons.
    Stepped,
    /// Configured at startup but never commanded by the loop.
    Passive,
}

/// Per-actuator configuration (`[[actuators]]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActuatorConfig {
    /// Human-readable name used in logs.
    pub name: String,
    /// Bus id.
    pub id: u8,
    /// Control role.
    pub role: ActuatorRole,
}

impl ActuatorConfig {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, id: u8, role: ActuatorRole) -> Self {
        Self {
            name: name.into(),
            id,
            role,
        }
    }

    /// The reference deployment: two coupled actuators and one stepped one.
    pub fn default_set() -> Vec<ActuatorConfig> {
        vec![
            ActuatorConfig::new("left", DEFAULT_LEFT_ID, ActuatorRole::Coupled),
            ActuatorConfig::new("right", DEFAULT_RIGHT_ID, ActuatorRole::Coupled),
            ActuatorConfig::new("larger", DEFAULT_STEPPED_ID, ActuatorRole::Stepped),
        ]
    }
}

/// Validate a set of actuator configurations.
///
/// # Validation Rules
/// 1. At least one actuator
/// 2. Names non-empty and unique
/// 3. Ids unique and `<= MAX_ACTUATOR_ID`
/// 4. At most one `stepped` actuator
pub fn validate_actuators(actuators: &[ActuatorConfig]) -> Result<(), ConfigError> {
    if actuators.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one actuator must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for actuator in actuators {
        if actuator.name.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "actuator with id {} has an empty name",
                actuator.id
            )));
        }
        if !names.insert(actuator.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Duplicate actuator name: {}",
                actuator.name
            )));
        }
        if actuator.id > MAX_ACTUATOR_ID {
            return Err(ConfigError::ValidationError(format!(
                "actuator {} id {} exceeds {}",
                actuator.name, actuator.id, MAX_ACTUATOR_ID
            )));
        }
        if !ids.insert(actuator.id) {
            return Err(ConfigError::ValidationError(format!(
                "Duplicate actuator id: {}",
                actuator.id
            )));
        }
    }

    let stepped = actuators
        .iter()
        .filter(|a| a.role == ActuatorRole::Stepped)
        .count();
    if stepped > 1 {
        return Err(ConfigError::ValidationError(format!(
            "at most one stepped actuator allowed, found {stepped}"
        )));
    }
    Ok(())
}
