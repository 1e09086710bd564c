//! Emulated actuator control table.

use servo_common::hal::consts::TORQUE_ENABLE;
use servo_common::hal::position::{decode_position, encode_position};
use servo_common::hal::registers::{Access, Register};

/// Size of the emulated control table in bytes.
pub const CONTROL_TABLE_SIZE: usize = 256;

/// Device error number: data range error.
const ERR_DATA_RANGE: u8 = 4;
/// Device error number: access error.
const ERR_ACCESS: u8 = 7;

/// One emulated actuator.
///
/// Motion is instantaneous: a goal written with torque on becomes the
/// present position immediately.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    table: [u8; CONTROL_TABLE_SIZE],
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self {
            table: [0; CONTROL_TABLE_SIZE],
        }
    }
}

impl SimulatedDevice {
    /// Fresh device with a zeroed control table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the torque enable register is set.
    pub fn torque_enabled(&self) -> bool {
        self.table[Register::TorqueEnable.address() as usize] == TORQUE_ENABLE
    }

    /// Present position register, sign-extended.
    pub fn present_position(&self) -> i32 {
        decode_position(self.raw_u32(Register::PresentPosition.address()))
    }

    /// Force the present position register.
    pub fn set_present_position(&mut self, position: i32) {
        self.store(
            Register::PresentPosition.address(),
            &encode_position(position).to_le_bytes(),
        );
    }

    /// Raw register value, zero-extended to 32 bits.
    pub fn register(&self, register: Register) -> u32 {
        let start = register.address() as usize;
        let mut bytes = [0u8; 4];
        bytes[..register.width()].copy_from_slice(&self.table[start..start + register.width()]);
        u32::from_le_bytes(bytes)
    }

    /// Apply a write instruction. Returns the device error byte.
    pub fn write(&mut self, address: u16, data: &[u8]) -> u8 {
        if !in_table(address, data.len()) {
            return ERR_DATA_RANGE;
        }
        if let Some(register) = Register::from_address(address) {
            if register.access() == Access::Read {
                return ERR_ACCESS;
            }
            // EEPROM area is locked while torque is on
            if register == Register::OperatingMode && self.torque_enabled() {
                return ERR_ACCESS;
            }
        }

        self.store(address, data);

        if address == Register::GoalPosition.address() && self.torque_enabled() {
            let goal = self.raw_u32(address);
            self.store(Register::PresentPosition.address(), &goal.to_le_bytes());
        }
        0
    }

    /// Apply a read instruction. Returns the payload or the device error byte.
    pub fn read(&self, address: u16, length: u16) -> Result<Vec<u8>, u8> {
        let length = length as usize;
        if !in_table(address, length) {
            return Err(ERR_DATA_RANGE);
        }
        let start = address as usize;
        Ok(self.table[start..start + length].to_vec())
    }

    fn raw_u32(&self, address: u16) -> u32 {
        let start = address as usize;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.table[start..start + 4]);
        u32::from_le_bytes(bytes)
    }

    fn store(&mut self, address: u16, data: &[u8]) {
        let start = address as usize;
        self.table[start..start + data.len()].copy_from_slice(data);
    }
}

fn in_table(address: u16, length: usize) -> bool {
    length > 0 && (address as usize) + length <= CONTROL_TABLE_SIZE
}
