//! # Servo HAL Library
//!
//! Actuator-side core of the servo control workspace: one
//! [`ActuatorController`] per physical actuator, the [`ActuatorSet`]
//! lifecycle manager, and the register transports they talk through.
//!
//! # Module Structure
//!
//! - [`actuator`] - Serialized register access for one actuator
//! - [`lifecycle`] - Scoped acquisition and teardown of all actuators
//! - [`transport_registry`] - Transport factory registration
//! - [`drivers`] - Transport implementations (simulation, serial)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────┐    ┌───────────────────┐
//! │ ActuatorSet  │───►│ ActuatorController │───►│ RegisterTransport │
//! │ (lifecycle)  │    │ (per-id mutex)     │    │ (shared)          │
//! └──────────────┘    └────────────────────┘    └─────────┬─────────┘
//!                                                         │
//!                                              simulation ┴ serial
//! ```

#![warn(missing_docs)]

pub mod actuator;
pub mod drivers;
pub mod lifecycle;
pub mod transport_registry;

pub use crate::actuator::{ActuatorController, ActuatorState, MoveError, PresentPosition};
pub use crate::lifecycle::{ActuatorSet, TeardownReport};
pub use crate::transport_registry::TransportRegistry;
