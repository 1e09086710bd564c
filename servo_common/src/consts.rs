//! System-wide constants for the servo workspace.
//!
//! Single source of truth for input sizing, loop pacing and default paths.
//! Protocol constants live in [`crate::hal::consts`].

/// Maximum number of continuous axes carried by an input snapshot.
pub const MAX_INPUT_AXES: usize = 8;

/// Maximum number of buttons carried by an input snapshot.
pub const MAX_INPUT_BUTTONS: usize = 32;

/// Default control loop tick interval in microseconds (1 kHz).
pub const DEFAULT_TICK_INTERVAL_US: u64 = 1000;

/// Ticks between periodic loop statistics log lines.
pub const STATS_LOG_INTERVAL_TICKS: u64 = 1000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/servo/config.toml";

/// Default service name used in logs.
pub const DEFAULT_SERVICE_NAME: &str = "servo-control";
