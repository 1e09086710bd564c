//! Bus protocol constants.
//!
//! Register addresses live in [`crate::hal::registers`]; this module holds
//! the numeric parameters of the protocol and the deployment defaults.

use static_assertions::const_assert;

/// Wire protocol version spoken on the bus.
pub const PROTOCOL_VERSION: f32 = 2.0;

/// Default bus speed in bits per second.
pub const DEFAULT_BAUD_RATE: u32 = 3_000_000;

/// Default serial device of the bus adapter.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB1";

/// Default read timeout for a single status packet, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 50;

/// Highest addressable actuator id (253 is reserved, 254 is broadcast).
pub const MAX_ACTUATOR_ID: u8 = 252;

/// Broadcast id (instruction is executed by every device, no status returned).
pub const BROADCAST_ID: u8 = 254;

/// Torque enable register value: torque on.
pub const TORQUE_ENABLE: u8 = 1;

/// Torque enable register value: torque off.
pub const TORQUE_DISABLE: u8 = 0;

/// Lower bound of any goal position written to a device.
pub const MIN_POSITION: i32 = -1_000_000;

/// Upper bound of any goal position written to a device.
pub const MAX_POSITION: i32 = 1_000_000;

/// Position step applied per tick at full input deflection.
pub const POSITION_INCREMENT: i32 = 100;

/// Default profile velocity written at startup.
pub const DEFAULT_PROFILE_VELOCITY: u32 = 1000;

/// Default profile acceleration written at startup.
pub const DEFAULT_PROFILE_ACCELERATION: u32 = 100;

/// Default actuator ids of the reference deployment.
pub const DEFAULT_LEFT_ID: u8 = 1;
/// Right coupled actuator id.
pub const DEFAULT_RIGHT_ID: u8 = 2;
/// Stepped (larger) actuator id.
pub const DEFAULT_STEPPED_ID: u8 = 0;

const_assert!(MIN_POSITION < 0 && MAX_POSITION > 0);
const_assert!(POSITION_INCREMENT > 0 && POSITION_INCREMENT < MAX_POSITION);
const_assert!(MAX_ACTUATOR_ID < BROADCAST_ID);
