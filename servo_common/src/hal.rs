//! Actuator bus constants, register map and transport abstraction.
//!
//! This module contains everything the actuator controller needs to know
//! about the bus without depending on a concrete transport driver.

pub mod config;
pub mod consts;
pub mod position;
pub mod registers;
pub mod transport;
