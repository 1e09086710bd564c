//! # Servo Control
//!
//! Joystick-driven control loop for a bus of position-controlled actuators.
//! Two coupled actuators follow one continuous axis; a third is stepped by
//! a pair of buttons.
//!
//! # Module Structure
//!
//! - [`mapping`] - Dead zone, inversion and button precedence
//! - [`cycle`] - Tick loop, statistics and orderly stop
//! - [`input`] - Input source implementations
//! - [`error`] - Binary-level error aggregation

pub mod cycle;
pub mod error;
pub mod input;
pub mod mapping;

pub use cycle::{ControlLoop, CycleStats, LoopState, LoopSummary, StopHandle, StopReason, TickReport};
pub use error::ControlError;
