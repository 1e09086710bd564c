//! Simulated bus implementation.

use super::device::SimulatedDevice;
use parking_lot::Mutex;
use servo_common::hal::position::decode_position;
use servo_common::hal::registers::Register;
use servo_common::hal::transport::{CommResult, HalError, RegisterTransport, TxOutcome};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{debug, trace};

/// Transactions kept in the log; older entries are dropped first.
pub const MAX_LOG_ENTRIES: usize = 16_384;

/// Direction of a logged transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Write instruction.
    Write,
    /// Read instruction.
    Read,
}

/// One transaction as seen by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Target device id.
    pub id: u8,
    /// Read or write.
    pub kind: TransactionKind,
    /// Control table address.
    pub address: u16,
    /// Written bytes, or the payload returned by a read.
    pub data: Vec<u8>,
    /// Result code reported to the caller.
    pub comm: CommResult,
    /// Device error byte reported to the caller.
    pub device_error: u8,
}

impl Transaction {
    /// Data interpreted as a little-endian integer, zero-extended.
    pub fn value_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        let len = self.data.len().min(4);
        bytes[..len].copy_from_slice(&self.data[..len]);
        u32::from_le_bytes(bytes)
    }
}

/// Injected faults for one id.
#[derive(Debug, Clone, Default)]
struct Faults {
    fail_reads: u32,
    fail_writes: u32,
    device_error: Option<u8>,
    offline: bool,
    reject_attach: bool,
    fail_detach: bool,
}

#[derive(Default)]
struct BusState {
    devices: HashMap<u8, SimulatedDevice>,
    attached: BTreeSet<u8>,
    faults: HashMap<u8, Faults>,
    log: VecDeque<Transaction>,
}

impl BusState {
    /// Fault check shared by reads and writes. `None` means proceed.
    fn check(&mut self, id: u8, is_read: bool) -> Option<CommResult> {
        if !self.attached.contains(&id) {
            return Some(CommResult::NotAvailable);
        }
        let faults = self.faults.entry(id).or_default();
        if faults.offline {
            return Some(CommResult::RxTimeout);
        }
        if is_read && faults.fail_reads > 0 {
            faults.fail_reads -= 1;
            return Some(CommResult::RxTimeout);
        }
        if !is_read && faults.fail_writes > 0 {
            faults.fail_writes -= 1;
            return Some(CommResult::TxFail);
        }
        None
    }

    fn record(&mut self, transaction: Transaction) {
        if self.log.len() == MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(transaction);
    }
}

/// In-memory register bus shared by all simulated devices.
///
/// Devices come into existence on first attach (or when a test presets a
/// register) and keep their control table across detach/attach cycles.
pub struct SimulatedBus {
    state: Mutex<BusState>,
}

impl SimulatedBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState::default()),
        }
    }

    /// Force the present position of device `id`.
    pub fn set_present_position(&self, id: u8, position: i32) {
        self.state
            .lock()
            .devices
            .entry(id)
            .or_default()
            .set_present_position(position);
    }

    /// Present position of device `id`, if it exists.
    pub fn present_position(&self, id: u8) -> Option<i32> {
        self.state
            .lock()
            .devices
            .get(&id)
            .map(SimulatedDevice::present_position)
    }

    /// Raw register value of device `id`, if it exists.
    pub fn register_u32(&self, id: u8, register: Register) -> Option<u32> {
        self.state
            .lock()
            .devices
            .get(&id)
            .map(|dev| dev.register(register))
    }

    /// True if device `id` has torque enabled.
    pub fn torque_enabled(&self, id: u8) -> bool {
        self.state
            .lock()
            .devices
            .get(&id)
            .is_some_and(SimulatedDevice::torque_enabled)
    }

    /// True if `id` currently holds an attachment.
    pub fn is_attached(&self, id: u8) -> bool {
        self.state.lock().attached.contains(&id)
    }

    /// Ids currently attached, ascending.
    pub fn attached_ids(&self) -> Vec<u8> {
        self.state.lock().attached.iter().copied().collect()
    }

    /// Fail the next `count` reads of `id` with `RxTimeout`.
    pub fn fail_next_reads(&self, id: u8, count: u32) {
        self.state.lock().faults.entry(id).or_default().fail_reads = count;
    }

    /// Fail the next `count` writes of `id` with `TxFail`.
    pub fn fail_next_writes(&self, id: u8, count: u32) {
        self.state.lock().faults.entry(id).or_default().fail_writes = count;
    }

    /// Make device `id` answer every transaction with `error`, or clear it.
    pub fn set_device_error(&self, id: u8, error: Option<u8>) {
        self.state.lock().faults.entry(id).or_default().device_error = error;
    }

    /// Make device `id` stop answering.
    pub fn set_offline(&self, id: u8, offline: bool) {
        self.state.lock().faults.entry(id).or_default().offline = offline;
    }

    /// Refuse attachment of `id`.
    pub fn reject_attach(&self, id: u8) {
        self.state.lock().faults.entry(id).or_default().reject_attach = true;
    }

    /// Fail detachment of `id` (the attachment is still dropped).
    pub fn fail_detach(&self, id: u8) {
        self.state.lock().faults.entry(id).or_default().fail_detach = true;
    }

    /// The most recent transactions, oldest first (at most [`MAX_LOG_ENTRIES`]).
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().log.iter().cloned().collect()
    }

    /// Write transactions addressed to `id` as `(address, value)` pairs.
    pub fn writes(&self, id: u8) -> Vec<(u16, u32)> {
        self.state
            .lock()
            .log
            .iter()
            .filter(|t| t.id == id && t.kind == TransactionKind::Write)
            .map(|t| (t.address, t.value_u32()))
            .collect()
    }

    /// Goal positions written successfully to `id`, in order.
    pub fn goal_history(&self, id: u8) -> Vec<i32> {
        self.state
            .lock()
            .log
            .iter()
            .filter(|t| {
                t.id == id
                    && t.kind == TransactionKind::Write
                    && t.address == Register::GoalPosition.address()
                    && t.comm.is_success()
                    && t.device_error == 0
            })
            .map(|t| decode_position(t.value_u32()))
            .collect()
    }

    /// Drop the transaction log.
    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterTransport for SimulatedBus {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn attach(&self, id: u8) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.faults.get(&id).is_some_and(|f| f.reject_attach) {
            return Err(HalError::SetupFailed(format!(
                "simulated device {id} refused attachment"
            )));
        }
        if !state.attached.insert(id) {
            return Err(HalError::SetupFailed(format!("device {id} already attached")));
        }
        if !state.devices.contains_key(&id) {
            debug!("Simulated device {} created", id);
            state.devices.insert(id, SimulatedDevice::new());
        }
        debug!("Simulated device {} attached", id);
        Ok(())
    }

    fn detach(&self, id: u8) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if !state.attached.remove(&id) {
            return Err(HalError::ShutdownFailed(format!("device {id} not attached")));
        }
        if state.faults.get(&id).is_some_and(|f| f.fail_detach) {
            return Err(HalError::ShutdownFailed(format!(
                "simulated device {id} failed to detach"
            )));
        }
        debug!("Simulated device {} detached", id);
        Ok(())
    }

    fn write(&self, id: u8, address: u16, data: &[u8]) -> TxOutcome<()> {
        let mut state = self.state.lock();
        let outcome = match state.check(id, false) {
            Some(comm) => TxOutcome::failed(comm),
            None => {
                let injected = state.faults.get(&id).and_then(|f| f.device_error);
                match injected {
                    Some(err) => TxOutcome::device_error(err, ()),
                    None => {
                        let err = state.devices.entry(id).or_default().write(address, data);
                        if err == 0 {
                            TxOutcome::ok(())
                        } else {
                            TxOutcome::device_error(err, ())
                        }
                    }
                }
            }
        };
        trace!(
            "sim write id={} addr={} len={} -> {}",
            id,
            address,
            data.len(),
            outcome.comm
        );
        state.record(Transaction {
            id,
            kind: TransactionKind::Write,
            address,
            data: data.to_vec(),
            comm: outcome.comm,
            device_error: outcome.device_error,
        });
        outcome
    }

    fn read(&self, id: u8, address: u16, length: u16) -> TxOutcome<Vec<u8>> {
        let mut state = self.state.lock();
        let outcome = match state.check(id, true) {
            Some(comm) => TxOutcome::failed(comm),
            None => {
                let injected = state.faults.get(&id).and_then(|f| f.device_error);
                let device = state.devices.entry(id).or_default();
                match (injected, device.read(address, length)) {
                    (Some(err), Ok(data)) => TxOutcome::device_error(err, data),
                    (Some(err), Err(_)) => TxOutcome::device_error(err, Vec::new()),
                    (None, Ok(data)) => TxOutcome::ok(data),
                    (None, Err(err)) => TxOutcome::device_error(err, Vec::new()),
                }
            }
        };
        trace!(
            "sim read id={} addr={} len={} -> {}",
            id, address, length, outcome.comm
        );
        state.record(Transaction {
            id,
            kind: TransactionKind::Read,
            address,
            data: outcome.value.clone().unwrap_or_default(),
            comm: outcome.comm,
            device_error: outcome.device_error,
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_common::hal::position::encode_position;
    use servo_common::hal::transport::CommError;

    fn goal_bytes(position: i32) -> [u8; 4] {
        encode_position(position).to_le_bytes()
    }

    #[test]
    fn unattached_device_is_not_available() {
        let bus = SimulatedBus::new();
        let outcome = bus.read(1, 132, 4);
        assert_eq!(outcome.comm, CommResult::NotAvailable);
    }

    #[test]
    fn attach_twice_fails() {
        let bus = SimulatedBus::new();
        bus.attach(1).unwrap();
        assert!(matches!(bus.attach(1), Err(HalError::SetupFailed(_))));
    }

    #[test]
    fn detach_unknown_fails() {
        let bus = SimulatedBus::new();
        assert!(matches!(bus.detach(9), Err(HalError::ShutdownFailed(_))));
    }

    #[test]
    fn write_then_read_register() {
        let bus = SimulatedBus::new();
        bus.attach(2).unwrap();
        assert!(bus.write_u32(2, 112, 1000).is_success());
        assert_eq!(bus.read_u32(2, 112).into_result(), Ok(1000));
    }

    #[test]
    fn goal_with_torque_moves_present() {
        let bus = SimulatedBus::new();
        bus.attach(1).unwrap();
        bus.write_u8(1, Register::TorqueEnable.address(), 1);
        bus.write(1, Register::GoalPosition.address(), &goal_bytes(-7));
        assert_eq!(bus.present_position(1), Some(-7));
        assert_eq!(bus.goal_history(1), vec![-7]);
    }

    #[test]
    fn injected_failures_are_consumed() {
        let bus = SimulatedBus::new();
        bus.attach(1).unwrap();
        bus.fail_next_reads(1, 2);
        assert_eq!(bus.read(1, 132, 4).comm, CommResult::RxTimeout);
        assert_eq!(bus.read(1, 132, 4).comm, CommResult::RxTimeout);
        assert!(bus.read(1, 132, 4).is_success());
    }

    #[test]
    fn offline_device_times_out() {
        let bus = SimulatedBus::new();
        bus.attach(1).unwrap();
        bus.set_offline(1, true);
        assert_eq!(
            bus.write_u8(1, 64, 1).into_result(),
            Err(CommError::Comm(CommResult::RxTimeout))
        );
        bus.set_offline(1, false);
        assert!(bus.write_u8(1, 64, 1).is_success());
    }

    #[test]
    fn transactions_are_logged() {
        let bus = SimulatedBus::new();
        bus.attach(3).unwrap();
        bus.write_u8(3, 64, 1);
        bus.read(3, 132, 4);
        let log = bus.transactions();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, TransactionKind::Write);
        assert_eq!(log[1].kind, TransactionKind::Read);
        assert_eq!(bus.writes(3), vec![(64, 1)]);
        bus.clear_log();
        assert!(bus.transactions().is_empty());
    }

    #[test]
    fn transaction_log_is_bounded() {
        let bus = SimulatedBus::new();
        bus.attach(1).unwrap();
        for i in 0..(MAX_LOG_ENTRIES + 500) {
            bus.write(1, 116, &goal_bytes(i as i32));
        }
        let log = bus.transactions();
        assert_eq!(log.len(), MAX_LOG_ENTRIES);
        // oldest entries were dropped
        assert_eq!(log[0].value_u32(), 500);
        assert_eq!(
            bus.goal_history(1).last(),
            Some(&((MAX_LOG_ENTRIES + 499) as i32))
        );
    }

    #[test]
    fn failed_detach_still_releases() {
        let bus = SimulatedBus::new();
        bus.attach(1).unwrap();
        bus.fail_detach(1);
        assert!(bus.detach(1).is_err());
        assert!(!bus.is_attached(1));
    }
}
