//! Transport registry.
//!
//! Maps a `bus.driver` name to the factory that builds the transport.
//! Constructed at startup and passed by value; no global state.

use servo_common::hal::config::BusConfig;
use servo_common::hal::transport::{HalError, RegisterTransport, TransportFactory};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of available register transports.
pub struct TransportRegistry {
    factories: HashMap<&'static str, TransportFactory>,
}

impl TransportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in transports.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_builtin(&mut registry);
        registry
    }

    /// Register a transport factory.
    ///
    /// # Panics
    /// Panics if a transport with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: TransportFactory) {
        if self.factories.contains_key(name) {
            panic!("Transport '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a transport factory by name.
    pub fn get_factory(&self, name: &str) -> Option<TransportFactory> {
        self.factories.get(name).copied()
    }

    /// Build the transport named by `config.driver`.
    ///
    /// # Errors
    /// Returns `HalError::TransportNotFound` for an unknown name, or whatever
    /// the factory reports.
    pub fn create(&self, config: &BusConfig) -> Result<Arc<dyn RegisterTransport>, HalError> {
        let factory = self
            .get_factory(&config.driver)
            .ok_or_else(|| HalError::TransportNotFound(config.driver.clone()))?;
        debug!("Creating transport '{}'", config.driver);
        factory(config)
    }

    /// List all registered transport names, sorted.
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
