//! Input source implementations.
//!
//! - [`IdleInput`] - Always neutral; holds every actuator still
//! - [`ScriptedInput`] - Replays a TOML script of timed snapshots
//! - `GamepadInput` - Physical gamepad via `gilrs` (feature `gamepad`)

mod idle;
mod script;

#[cfg(feature = "gamepad")]
mod gamepad;

pub use idle::IdleInput;
pub use script::{InputScript, ScriptStep, ScriptedInput};

#[cfg(feature = "gamepad")]
pub use gamepad::GamepadInput;

use clap::ValueEnum;

/// Input backend selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    /// Neutral input forever.
    Idle,
    /// TOML script replay.
    Script,
    /// Physical gamepad.
    Gamepad,
}
