//! Simulation transport module.
//!
//! In-memory register bus for development and testing without hardware.
//! Every attached id gets an emulated device with its own control table;
//! faults can be injected per id.

mod bus;
mod device;

pub use bus::{MAX_LOG_ENTRIES, SimulatedBus, Transaction, TransactionKind};
pub use device::SimulatedDevice;

use servo_common::hal::config::BusConfig;
use servo_common::hal::transport::{HalError, RegisterTransport};
use std::sync::Arc;

/// Factory function to create a simulated bus.
pub fn create_transport(_config: &BusConfig) -> Result<Arc<dyn RegisterTransport>, HalError> {
    Ok(Arc::new(SimulatedBus::new()))
}
