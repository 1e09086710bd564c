//! Servo Common Library
//!
//! This crate provides shared constants, configuration loading and the
//! collaborator traits used by the servo control workspace crates.
//!
//! # Module Structure
//!
//! - [`hal`] - Register map, position encoding and the `RegisterTransport` trait
//! - [`input`] - Input snapshot and the `InputSource` trait
//! - [`control`] - Input-to-motion mapping configuration
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use servo_common::prelude::*;
//!
//! let config = ServoConfig::default();
//! assert_eq!(config.actuators.len(), 3);
//! ```

pub mod config;
pub mod consts;
pub mod control;
pub mod hal;
pub mod input;
pub mod prelude;
