//! Control table register map.
//!
//! Addresses and widths are protocol constants of the actuator firmware;
//! they are not configurable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access direction of a register as used by this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Written by the host.
    Write,
    /// Read by the host.
    Read,
}

/// Control table registers used by the actuator controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Operating mode (1 byte). Writable only while torque is off.
    OperatingMode,
    /// Torque enable flag (1 byte).
    TorqueEnable,
    /// Profile acceleration (4 bytes, unsigned).
    ProfileAcceleration,
    /// Profile velocity (4 bytes, unsigned).
    ProfileVelocity,
    /// Goal position (4 bytes, two's complement).
    GoalPosition,
    /// Present position (4 bytes, two's complement).
    PresentPosition,
}

impl Register {
    /// All registers, in address order.
    pub const ALL: [Register; 6] = [
        Register::OperatingMode,
        Register::TorqueEnable,
        Register::ProfileAcceleration,
        Register::ProfileVelocity,
        Register::GoalPosition,
        Register::PresentPosition,
    ];

    /// Control table address.
    pub const fn address(self) -> u16 {
        match self {
            Register::OperatingMode => 11,
            Register::TorqueEnable => 64,
            Register::ProfileAcceleration => 108,
            Register::ProfileVelocity => 112,
            Register::GoalPosition => 116,
            Register::PresentPosition => 132,
        }
    }

    /// Register width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Register::OperatingMode | Register::TorqueEnable => 1,
            _ => 4,
        }
    }

    /// Direction in which the register is accessed.
    pub const fn access(self) -> Access {
        match self {
            Register::PresentPosition => Access::Read,
            _ => Access::Write,
        }
    }

    /// Look up a register by its address.
    pub fn from_address(address: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.address() == address)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::OperatingMode => "operating_mode",
            Register::TorqueEnable => "torque_enable",
            Register::ProfileAcceleration => "profile_acceleration",
            Register::ProfileVelocity => "profile_velocity",
            Register::GoalPosition => "goal_position",
            Register::PresentPosition => "present_position",
        };
        write!(f, "{}@{}", name, self.address())
    }
}

/// Device-side control strategy selected through [`Register::OperatingMode`].
///
/// Serialized as the raw mode code so TOML carries `operating_mode = 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum OperatingMode {
    /// Current (torque) control.
    Current,
    /// Velocity control.
    Velocity,
    /// Single-turn position control.
    Position,
    /// Multi-turn absolute position control.
    #[default]
    ExtendedPosition,
    /// Position control with current limit.
    CurrentBasedPosition,
    /// Raw PWM output.
    Pwm,
}

impl OperatingMode {
    /// Mode code written to the device.
    pub const fn code(self) -> u8 {
        match self {
            OperatingMode::Current => 0,
            OperatingMode::Velocity => 1,
            OperatingMode::Position => 3,
            OperatingMode::ExtendedPosition => 4,
            OperatingMode::CurrentBasedPosition => 5,
            OperatingMode::Pwm => 16,
        }
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OperatingMode::Current),
            1 => Ok(OperatingMode::Velocity),
            3 => Ok(OperatingMode::Position),
            4 => Ok(OperatingMode::ExtendedPosition),
            5 => Ok(OperatingMode::CurrentBasedPosition),
            16 => Ok(OperatingMode::Pwm),
            other => Err(format!("unknown operating mode code {other}")),
        }
    }
}

impl From<OperatingMode> for u8 {
    fn from(mode: OperatingMode) -> u8 {
        mode.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_map_matches_control_table() {
        assert_eq!(Register::TorqueEnable.address(), 64);
        assert_eq!(Register::OperatingMode.address(), 11);
        assert_eq!(Register::ProfileAcceleration.address(), 108);
        assert_eq!(Register::ProfileVelocity.address(), 112);
        assert_eq!(Register::GoalPosition.address(), 116);
        assert_eq!(Register::PresentPosition.address(), 132);
    }

    #[test]
    fn register_widths() {
        assert_eq!(Register::TorqueEnable.width(), 1);
        assert_eq!(Register::OperatingMode.width(), 1);
        for reg in [
            Register::ProfileAcceleration,
            Register::ProfileVelocity,
            Register::GoalPosition,
            Register::PresentPosition,
        ] {
            assert_eq!(reg.width(), 4, "{reg}");
        }
    }

    #[test]
    fn only_present_position_is_read() {
        for reg in Register::ALL {
            let expected = if reg == Register::PresentPosition {
                Access::Read
            } else {
                Access::Write
            };
            assert_eq!(reg.access(), expected);
        }
    }

    #[test]
    fn from_address_roundtrip() {
        for reg in Register::ALL {
            assert_eq!(Register::from_address(reg.address()), Some(reg));
        }
        assert_eq!(Register::from_address(0), None);
    }

    #[test]
    fn operating_mode_codes() {
        assert_eq!(OperatingMode::default(), OperatingMode::ExtendedPosition);
        assert_eq!(OperatingMode::ExtendedPosition.code(), 4);
        assert_eq!(OperatingMode::try_from(4), Ok(OperatingMode::ExtendedPosition));
        assert!(OperatingMode::try_from(2).is_err());
    }

    #[test]
    fn operating_mode_toml() {
        #[derive(Debug, Deserialize, Serialize, PartialEq)]
        struct Wrapper {
            mode: OperatingMode,
        }

        let parsed: Wrapper = toml::from_str("mode = 4").unwrap();
        assert_eq!(parsed.mode, OperatingMode::ExtendedPosition);
        assert!(toml::from_str::<Wrapper>("mode = 7").is_err());
        assert!(toml::to_string(&parsed).unwrap().contains("mode = 4"));
    }
}
