//! Register transport implementations.
//!
//! - [`simulation`] - In-memory bus for development and testing
//! - [`serial`] - Protocol 2.0 over a half-duplex serial adapter
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `RegisterTransport` from `servo_common::hal::transport`
//! 3. Register its factory in [`register_builtin`]

pub mod serial;
pub mod simulation;

use crate::transport_registry::TransportRegistry;

/// Register all built-in transports.
pub fn register_builtin(registry: &mut TransportRegistry) {
    registry.register("simulation", simulation::create_transport);
    registry.register("serial", serial::create_transport);
}
