//! Input mapping and loop pacing configuration (`[control]`).

use crate::config::ConfigError;
use crate::consts::{DEFAULT_TICK_INTERVAL_US, MAX_INPUT_AXES, MAX_INPUT_BUTTONS};
use crate::hal::consts::POSITION_INCREMENT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default dead-zone threshold on the coupled axis.
pub const DEFAULT_DEAD_ZONE: f64 = 0.1;

/// Default coupled axis index.
pub const DEFAULT_COUPLED_AXIS: usize = 0;

/// Default decrement button index.
pub const DEFAULT_DECREMENT_BUTTON: usize = 4;

/// Default increment button index.
pub const DEFAULT_INCREMENT_BUTTON: usize = 5;

fn default_tick_interval_us() -> u64 {
    DEFAULT_TICK_INTERVAL_US
}

fn default_dead_zone() -> f64 {
    DEFAULT_DEAD_ZONE
}

fn default_position_increment() -> i32 {
    POSITION_INCREMENT
}

fn default_axis() -> usize {
    DEFAULT_COUPLED_AXIS
}

fn default_true() -> bool {
    true
}

fn default_decrement_button() -> usize {
    DEFAULT_DECREMENT_BUTTON
}

fn default_increment_button() -> usize {
    DEFAULT_INCREMENT_BUTTON
}

/// Control loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlConfig {
    /// Minimum time between tick starts. 0 yields instead of sleeping.
    #[serde(default = "default_tick_interval_us")]
    pub tick_interval_us: u64,

    /// Axis magnitudes at or below this value are ignored.
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,

    /// Position step at full deflection / per button tick.
    #[serde(default = "default_position_increment")]
    pub position_increment: i32,

    /// Axis index driving the coupled actuators.
    #[serde(default = "default_axis")]
    pub axis: usize,

    /// Negate the axis value at the input boundary.
    #[serde(default = "default_true")]
    pub invert_axis: bool,

    /// Button index stepping the stepped actuator down (takes precedence).
    #[serde(default = "default_decrement_button")]
    pub decrement_button: usize,

    /// Button index stepping the stepped actuator up.
    #[serde(default = "default_increment_button")]
    pub increment_button: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: default_tick_interval_us(),
            dead_zone: default_dead_zone(),
            position_increment: default_position_increment(),
            axis: default_axis(),
            invert_axis: true,
            decrement_button: default_decrement_button(),
            increment_button: default_increment_button(),
        }
    }
}

impl ControlConfig {
    /// Tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(self.tick_interval_us)
    }

    /// Validate the control configuration.
    ///
    /// # Validation Rules
    /// 1. `dead_zone` in `[0, 1)`
    /// 2. `position_increment` > 0
    /// 3. `axis` < `MAX_INPUT_AXES`
    /// 4. button indices < `MAX_INPUT_BUTTONS` and distinct
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(ConfigError::ValidationError(format!(
                "control.dead_zone {} must be in [0, 1)",
                self.dead_zone
            )));
        }
        if self.position_increment <= 0 {
            return Err(ConfigError::ValidationError(
                "control.position_increment must be greater than 0".to_string(),
            ));
        }
        if self.axis >= MAX_INPUT_AXES {
            return Err(ConfigError::ValidationError(format!(
                "control.axis {} out of range (max {})",
                self.axis,
                MAX_INPUT_AXES - 1
            )));
        }
        for (label, index) in [
            ("decrement_button", self.decrement_button),
            ("increment_button", self.increment_button),
        ] {
            if index >= MAX_INPUT_BUTTONS {
                return Err(ConfigError::ValidationError(format!(
                    "control.{label} {index} out of range (max {})",
                    MAX_INPUT_BUTTONS - 1
                )));
            }
        }
        if self.decrement_button == self.increment_button {
            return Err(ConfigError::ValidationError(
                "control.decrement_button and control.increment_button must differ".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_mapping() {
        let config = ControlConfig::default();
        assert_eq!(config.axis, 0);
        assert!(config.invert_axis);
        assert_eq!(config.decrement_button, 4);
        assert_eq!(config.increment_button, 5);
        assert_eq!(config.position_increment, 100);
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn dead_zone_out_of_range() {
        let config = ControlConfig {
            dead_zone: 1.0,
            ..ControlConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ControlConfig {
            dead_zone: -0.1,
            ..ControlConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn same_buttons_rejected() {
        let config = ControlConfig {
            increment_button: 4,
            ..ControlConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn axis_out_of_range() {
        let config = ControlConfig {
            axis: MAX_INPUT_AXES,
            ..ControlConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_increment_rejected() {
        let config = ControlConfig {
            position_increment: 0,
            ..ControlConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
