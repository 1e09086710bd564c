//! Serial bus implementation.

use super::packet::{self, HEADER, PREFIX_LEN, StatusPacket};
use parking_lot::Mutex;
use serialport::{ClearBuffer, SerialPort};
use servo_common::hal::config::BusConfig;
use servo_common::hal::transport::{CommResult, HalError, RegisterTransport, TxOutcome};
use std::collections::BTreeSet;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Bytes discarded while hunting for a header before giving up.
const MAX_NOISE_BYTES: usize = 1024;

struct PortState {
    port: Option<Box<dyn SerialPort>>,
    attached: BTreeSet<u8>,
}

/// Protocol 2.0 transport on a serial device.
///
/// All transactions hold the port lock from transmit until the status
/// packet is decoded, so concurrent actuators never interleave on the wire.
pub struct SerialBus {
    device: String,
    baud_rate: u32,
    timeout: Duration,
    state: Mutex<PortState>,
}

impl SerialBus {
    /// Create a closed bus for the configured device.
    pub fn new(config: &BusConfig) -> Self {
        Self {
            device: config.device.clone(),
            baud_rate: config.baud_rate,
            timeout: Duration::from_millis(config.read_timeout_ms),
            state: Mutex::new(PortState {
                port: None,
                attached: BTreeSet::new(),
            }),
        }
    }

    /// Serial device path.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// True while at least one actuator holds the port open.
    pub fn is_open(&self) -> bool {
        self.state.lock().port.is_some()
    }

    fn open(&self) -> Result<Box<dyn SerialPort>, HalError> {
        let port = serialport::new(&self.device, self.baud_rate)
            .timeout(self.timeout)
            .open()
            .map_err(|e| {
                HalError::SetupFailed(format!("failed to open {}: {}", self.device, e))
            })?;
        info!("Opened {} at {} baud", self.device, self.baud_rate);
        Ok(port)
    }

    fn transact(&self, id: u8, request: &[u8]) -> Result<StatusPacket, CommResult> {
        let mut state = self.state.lock();
        if !state.attached.contains(&id) {
            return Err(CommResult::NotAvailable);
        }
        let port = state.port.as_mut().ok_or(CommResult::NotAvailable)?;

        if let Err(e) = port.clear(ClearBuffer::Input) {
            trace!("Input flush failed on {}: {}", self.device, e);
        }
        port.write_all(request).map_err(|e| {
            debug!("Transmit to id {} failed: {}", id, e);
            CommResult::TxFail
        })?;
        port.flush().map_err(|_| CommResult::TxFail)?;

        receive_status(port, id)
    }
}

/// Read one status packet addressed from `expected_id`.
///
/// Leading noise is skipped until a header is found.
///
/// # Errors
/// - `RxTimeout` if the reader times out or reaches end of input
/// - `RxFail` for other I/O errors
/// - `RxCorrupt` for a malformed frame or a reply from another id
pub fn receive_status<R: Read + ?Sized>(
    reader: &mut R,
    expected_id: u8,
) -> Result<StatusPacket, CommResult> {
    let mut frame = Vec::with_capacity(PREFIX_LEN + 16);
    let mut skipped = 0usize;

    while frame.len() < HEADER.len() {
        let byte = read_byte(reader)?;
        frame.push(byte);
        if !HEADER.starts_with(&frame) {
            // keep the longest suffix that is still a header prefix
            let keep = (1..frame.len())
                .rev()
                .find(|&n| HEADER.starts_with(&frame[frame.len() - n..]))
                .unwrap_or(0);
            skipped += frame.len() - keep;
            frame.drain(..frame.len() - keep);
            if skipped > MAX_NOISE_BYTES {
                return Err(CommResult::RxCorrupt);
            }
        }
    }

    let mut rest = [0u8; 3];
    read_exact(reader, &mut rest)?;
    frame.extend_from_slice(&rest);
    let length = packet::declared_length(&frame).ok_or(CommResult::RxCorrupt)?;

    let mut body = vec![0u8; length];
    read_exact(reader, &mut body)?;
    frame.extend_from_slice(&body);

    let status = packet::decode_status(&frame)?;
    if status.id != expected_id {
        warn!(
            "Status from id {} while waiting for id {}",
            status.id, expected_id
        );
        return Err(CommResult::RxCorrupt);
    }
    Ok(status)
}

fn read_byte<R: Read + ?Sized>(reader: &mut R) -> Result<u8, CommResult> {
    let mut byte = [0u8; 1];
    read_exact(reader, &mut byte)?;
    Ok(byte[0])
}

fn read_exact<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<(), CommResult> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof | io::ErrorKind::WouldBlock => {
            CommResult::RxTimeout
        }
        _ => CommResult::RxFail,
    })
}

impl RegisterTransport for SerialBus {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn attach(&self, id: u8) -> Result<(), HalError> {
        {
            let mut state = self.state.lock();
            if state.attached.contains(&id) {
                return Err(HalError::SetupFailed(format!("id {id} already attached")));
            }
            if state.port.is_none() {
                state.port = Some(self.open()?);
            }
            state.attached.insert(id);
        }

        // presence check only; a silent device is reported, not rejected
        match self.transact(id, &packet::ping(id)) {
            Ok(status) if status.error == 0 => debug!("id {} answered ping", id),
            Ok(status) => warn!("id {} answered ping with error 0x{:02x}", id, status.error),
            Err(comm) => warn!("id {} did not answer ping: {}", id, comm),
        }
        Ok(())
    }

    fn detach(&self, id: u8) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if !state.attached.remove(&id) {
            return Err(HalError::ShutdownFailed(format!("id {id} not attached")));
        }
        if state.attached.is_empty() && state.port.take().is_some() {
            info!("Closed {}", self.device);
        }
        Ok(())
    }

    fn write(&self, id: u8, address: u16, data: &[u8]) -> TxOutcome<()> {
        match self.transact(id, &packet::write(id, address, data)) {
            Ok(status) if status.error == 0 => TxOutcome::ok(()),
            Ok(status) => TxOutcome::device_error(status.error, ()),
            Err(comm) => TxOutcome::failed(comm),
        }
    }

    fn read(&self, id: u8, address: u16, length: u16) -> TxOutcome<Vec<u8>> {
        match self.transact(id, &packet::read(id, address, length)) {
            Ok(status) if status.error != 0 => TxOutcome::device_error(status.error, status.params),
            Ok(status) if status.params.len() != length as usize => {
                TxOutcome::failed(CommResult::RxCorrupt)
            }
            Ok(status) => TxOutcome::ok(status.params),
            Err(comm) => TxOutcome::failed(comm),
        }
    }
}
