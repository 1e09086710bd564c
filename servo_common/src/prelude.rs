//! Prelude module for common re-exports.
//!
//! ```rust
//! use servo_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{load_config, ConfigError, ConfigLoader, LogLevel, ServoConfig, SharedConfig};
pub use crate::control::ControlConfig;
pub use crate::hal::config::{ActuatorConfig, ActuatorRole, BusConfig, StartupConfig};

// ─── Bus ────────────────────────────────────────────────────────────
pub use crate::hal::consts::{MAX_POSITION, MIN_POSITION, POSITION_INCREMENT};
pub use crate::hal::position::{clamp_goal_position, decode_position, encode_position};
pub use crate::hal::registers::{OperatingMode, Register};
pub use crate::hal::transport::{
    CommError, CommResult, HalError, RegisterTransport, TransportFactory, TxOutcome,
};

// ─── Input ──────────────────────────────────────────────────────────
pub use crate::consts::{MAX_INPUT_AXES, MAX_INPUT_BUTTONS};
pub use crate::input::{InputError, InputSnapshot, InputSource};
