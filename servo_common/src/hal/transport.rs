//! Register transport trait and error types.
//!
//! This module defines:
//! - `RegisterTransport` trait - Byte-oriented register access on a shared bus
//! - `TxOutcome` - Raw result of one transaction (result code + device error)
//! - `CommError` - Transaction-level failure
//! - `HalError` - Setup, shutdown and configuration failures
//! - `TransportFactory` type alias - Factory function type

use crate::hal::config::BusConfig;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Communication result code reported by the transport for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommResult {
    /// Instruction sent and a valid status packet received.
    Success,
    /// Port is in use by another transaction.
    PortBusy,
    /// Failed to transmit the instruction packet.
    TxFail,
    /// Failed to receive the status packet.
    RxFail,
    /// Malformed instruction packet.
    TxError,
    /// Status packet still incomplete.
    RxWaiting,
    /// No status packet within the read timeout.
    RxTimeout,
    /// Status packet failed header, id or checksum validation.
    RxCorrupt,
    /// Port not open or device not attached.
    NotAvailable,
}

impl CommResult {
    /// Numeric code, compatible with the vendor SDK numbering.
    pub const fn code(self) -> i32 {
        match self {
            CommResult::Success => 0,
            CommResult::PortBusy => -1000,
            CommResult::TxFail => -1001,
            CommResult::RxFail => -1002,
            CommResult::TxError => -2000,
            CommResult::RxWaiting => -3000,
            CommResult::RxTimeout => -3001,
            CommResult::RxCorrupt => -3002,
            CommResult::NotAvailable => -9000,
        }
    }

    /// Returns true for [`CommResult::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, CommResult::Success)
    }
}

impl fmt::Display for CommResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CommResult::Success => "success",
            CommResult::PortBusy => "port is in use",
            CommResult::TxFail => "failed to transmit instruction packet",
            CommResult::RxFail => "failed to get status packet",
            CommResult::TxError => "incorrect instruction packet",
            CommResult::RxWaiting => "now receiving status packet",
            CommResult::RxTimeout => "no status packet",
            CommResult::RxCorrupt => "incorrect status packet",
            CommResult::NotAvailable => "port or device not available",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

/// Error byte carried by a device status packet.
///
/// Bit 7 is the hardware alert flag; bits 0..=6 hold the error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceError(pub u8);

impl DeviceError {
    /// Hardware alert flag.
    pub const ALERT: u8 = 0x80;

    /// True if the device raised its hardware alert flag.
    pub const fn is_alert(self) -> bool {
        self.0 & Self::ALERT != 0
    }

    /// Error number with the alert flag masked out.
    pub const fn number(self) -> u8 {
        self.0 & !Self::ALERT
    }

    fn describe(self) -> &'static str {
        match self.number() {
            0 => "hardware alert",
            1 => "result fail",
            2 => "instruction error",
            3 => "crc error",
            4 => "data range error",
            5 => "data length error",
            6 => "data limit error",
            7 => "access error",
            _ => "unknown error",
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.describe(), self.0)
    }
}

/// Transaction-level communication failure.
///
/// Non-fatal: the operation that hit it reports failure and the next
/// control tick naturally retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommError {
    /// Transport reported a non-success result code.
    #[error("communication failed: {0}")]
    Comm(CommResult),

    /// Device answered with a nonzero error byte.
    #[error("device error: {0}")]
    Device(DeviceError),
}

/// Raw outcome of one register transaction.
///
/// Mirrors what the bus reports: a communication result, the device error
/// byte (0 when absent) and the decoded payload when a status packet arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome<T> {
    /// Transport-level result.
    pub comm: CommResult,
    /// Device error byte from the status packet.
    pub device_error: u8,
    /// Payload, present when a status packet was decoded.
    pub value: Option<T>,
}

impl<T> TxOutcome<T> {
    /// Successful transaction carrying `value`.
    pub fn ok(value: T) -> Self {
        Self {
            comm: CommResult::Success,
            device_error: 0,
            value: Some(value),
        }
    }

    /// Transaction that failed at the transport level.
    pub fn failed(comm: CommResult) -> Self {
        Self {
            comm,
            device_error: 0,
            value: None,
        }
    }

    /// Status packet received but the device flagged an error.
    pub fn device_error(error: u8, value: T) -> Self {
        Self {
            comm: CommResult::Success,
            device_error: error,
            value: Some(value),
        }
    }

    /// True if the transport succeeded and the device reported no error.
    pub fn is_success(&self) -> bool {
        self.comm.is_success() && self.device_error == 0
    }

    /// Map the payload, keeping result code and error byte.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TxOutcome<U> {
        TxOutcome {
            comm: self.comm,
            device_error: self.device_error,
            value: self.value.map(f),
        }
    }

    /// Collapse into a `Result`, treating any failure as [`CommError`].
    pub fn into_result(self) -> Result<T, CommError> {
        if !self.comm.is_success() {
            return Err(CommError::Comm(self.comm));
        }
        if self.device_error != 0 {
            return Err(CommError::Device(DeviceError(self.device_error)));
        }
        self.value.ok_or(CommError::Comm(CommResult::RxCorrupt))
    }
}

/// Error types for setup, teardown and transport selection.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Port open, baud-rate negotiation or device attach failed.
    #[error("Setup failed: {0}")]
    SetupFailed(String),

    /// Teardown of a device or port failed.
    #[error("Shutdown failed: {0}")]
    ShutdownFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Transport driver not found
    #[error("Transport not found: {0}")]
    TransportNotFound(String),

    /// Register transaction failed
    #[error("Hardware communication error: {0}")]
    Communication(#[from] CommError),
}

/// Factory function type for creating transport instances.
pub type TransportFactory = fn(&BusConfig) -> Result<Arc<dyn RegisterTransport>, HalError>;

/// Byte-oriented register access on a shared bus.
///
/// One transport instance is shared by every actuator controller on the bus.
/// Implementations serialize bus access internally; every call blocks until
/// the transaction completes or fails.
///
/// # Lifecycle
///
/// 1. `attach(id)` - Called once per actuator before any transaction
/// 2. `write()` / `read()` - Register transactions
/// 3. `detach(id)` - Called once per actuator at teardown
pub trait RegisterTransport: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation", "serial").
    fn name(&self) -> &'static str;

    /// Acquire bus access for device `id`, opening the port if needed.
    ///
    /// # Errors
    /// Return `HalError::SetupFailed` if the port cannot be opened or
    /// configured.
    fn attach(&self, id: u8) -> Result<(), HalError>;

    /// Release bus access for device `id`, closing the port when the last
    /// device detaches.
    ///
    /// # Errors
    /// Return `HalError::ShutdownFailed` if the device was never attached
    /// or the port is already closed.
    fn detach(&self, id: u8) -> Result<(), HalError>;

    /// Write `data` starting at control table `address` of device `id`.
    fn write(&self, id: u8, address: u16, data: &[u8]) -> TxOutcome<()>;

    /// Read `length` bytes starting at control table `address` of device `id`.
    fn read(&self, id: u8, address: u16, length: u16) -> TxOutcome<Vec<u8>>;

    /// Write a single byte register.
    fn write_u8(&self, id: u8, address: u16, value: u8) -> TxOutcome<()> {
        self.write(id, address, &[value])
    }

    /// Write a 4-byte little-endian register.
    fn write_u32(&self, id: u8, address: u16, value: u32) -> TxOutcome<()> {
        self.write(id, address, &value.to_le_bytes())
    }

    /// Read a 4-byte little-endian register.
    fn read_u32(&self, id: u8, address: u16) -> TxOutcome<u32> {
        let outcome = self.read(id, address, 4);
        match outcome.value.as_deref() {
            Some(&[b0, b1, b2, b3]) => TxOutcome {
                comm: outcome.comm,
                device_error: outcome.device_error,
                value: Some(u32::from_le_bytes([b0, b1, b2, b3])),
            },
            Some(_) => TxOutcome::failed(CommResult::RxCorrupt),
            None => TxOutcome {
                comm: outcome.comm,
                device_error: outcome.device_error,
                value: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_success_into_result() {
        assert_eq!(TxOutcome::ok(7u32).into_result(), Ok(7));
        assert!(TxOutcome::ok(()).is_success());
    }

    #[test]
    fn outcome_comm_failure_into_result() {
        let outcome: TxOutcome<u32> = TxOutcome::failed(CommResult::RxTimeout);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.into_result(),
            Err(CommError::Comm(CommResult::RxTimeout))
        );
    }

    #[test]
    fn outcome_device_error_into_result() {
        let outcome = TxOutcome::device_error(0x84, 12u32);
        assert!(!outcome.is_success());
        match outcome.into_result() {
            Err(CommError::Device(err)) => {
                assert!(err.is_alert());
                assert_eq!(err.number(), 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn outcome_missing_payload_is_corrupt() {
        let outcome: TxOutcome<u32> = TxOutcome {
            comm: CommResult::Success,
            device_error: 0,
            value: None,
        };
        assert_eq!(
            outcome.into_result(),
            Err(CommError::Comm(CommResult::RxCorrupt))
        );
    }

    #[test]
    fn comm_result_codes() {
        assert_eq!(CommResult::Success.code(), 0);
        assert_eq!(CommResult::RxTimeout.code(), -3001);
        assert!(CommResult::TxFail.to_string().contains("-1001"));
    }

    #[test]
    fn hal_error_display() {
        let err = HalError::SetupFailed("port".to_string());
        assert!(err.to_string().contains("port"));

        let err: HalError = CommError::Comm(CommResult::TxFail).into();
        assert!(err.to_string().contains("transmit"));
    }
}
