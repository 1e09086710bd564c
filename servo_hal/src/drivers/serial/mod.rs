//! Serial transport module.
//!
//! Protocol 2.0 over a half-duplex USB serial adapter. One port is shared
//! by every actuator on the bus; it opens on the first attach and closes
//! when the last actuator detaches.

mod bus;
pub mod packet;

pub use bus::{SerialBus, receive_status};

use servo_common::hal::config::BusConfig;
use servo_common::hal::transport::{HalError, RegisterTransport};
use std::sync::Arc;

/// Factory function to create a serial bus from `[bus]` settings.
///
/// The port is not opened here.
pub fn create_transport(config: &BusConfig) -> Result<Arc<dyn RegisterTransport>, HalError> {
    Ok(Arc::new(SerialBus::new(config)))
}
