//! Protocol 2.0 packet codec.
//!
//! ```text
//! FF FF FD 00 | ID | LEN_L LEN_H | INST | PARAM... | CRC_L CRC_H
//! ```
//!
//! `LEN` counts instruction, parameters and CRC after byte stuffing. The CRC
//! covers everything from the header up to the last parameter byte.

use servo_common::hal::transport::CommResult;

/// Packet header.
pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// Bytes before the instruction: header, id, length.
pub const PREFIX_LEN: usize = 7;

/// Instruction codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    /// Presence check.
    Ping = 0x01,
    /// Read from the control table.
    Read = 0x02,
    /// Write to the control table.
    Write = 0x03,
    /// Status packet returned by a device.
    Status = 0x55,
}

/// A decoded status packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// Responding device id.
    pub id: u8,
    /// Device error byte.
    pub error: u8,
    /// Unstuffed parameters following the error byte.
    pub params: Vec<u8>,
}

/// CRC-16 with polynomial 0x8005, zero init, no reflection.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |mut crc, &byte| {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x8005
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// Insert `FD` after every `FF FF FD` in `body` (instruction onward).
fn stuff(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + body.len() / 3);
    for &byte in body {
        out.push(byte);
        if out.len() >= 3 && out[out.len() - 3..] == [0xFF, 0xFF, 0xFD] {
            out.push(0xFD);
        }
    }
    out
}

/// Remove the `FD` that follows every `FF FF FD` in `body`.
fn unstuff(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        out.push(body[i]);
        if out.len() >= 3
            && out[out.len() - 3..] == [0xFF, 0xFF, 0xFD]
            && body.get(i + 1) == Some(&0xFD)
        {
            i += 1;
        }
        i += 1;
    }
    out
}

/// Build a complete packet.
pub fn encode(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(params.len() + 1);
    body.push(instruction as u8);
    body.extend_from_slice(params);
    let body = stuff(&body);

    let length = (body.len() + 2) as u16;
    let mut packet = Vec::with_capacity(PREFIX_LEN + body.len() + 2);
    packet.extend_from_slice(&HEADER);
    packet.push(id);
    packet.extend_from_slice(&length.to_le_bytes());
    packet.extend_from_slice(&body);
    let crc = crc16(&packet);
    packet.extend_from_slice(&crc.to_le_bytes());
    packet
}

/// Ping instruction for `id`.
pub fn ping(id: u8) -> Vec<u8> {
    encode(id, Instruction::Ping, &[])
}

/// Write instruction: `data` at `address`.
pub fn write(id: u8, address: u16, data: &[u8]) -> Vec<u8> {
    let mut params = Vec::with_capacity(data.len() + 2);
    params.extend_from_slice(&address.to_le_bytes());
    params.extend_from_slice(data);
    encode(id, Instruction::Write, &params)
}

/// Read instruction: `length` bytes at `address`.
pub fn read(id: u8, address: u16, length: u16) -> Vec<u8> {
    let [a0, a1] = address.to_le_bytes();
    let [l0, l1] = length.to_le_bytes();
    encode(id, Instruction::Read, &[a0, a1, l0, l1])
}

/// Length field of a frame whose first [`PREFIX_LEN`] bytes are present.
pub fn declared_length(prefix: &[u8]) -> Option<usize> {
    match prefix {
        [0xFF, 0xFF, 0xFD, 0x00, _, lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi]) as usize),
        _ => None,
    }
}

/// Validate and decode a complete status frame.
///
/// # Errors
/// `RxCorrupt` for a bad header, length, CRC or instruction byte.
pub fn decode_status(frame: &[u8]) -> Result<StatusPacket, CommResult> {
    let length = declared_length(frame).ok_or(CommResult::RxCorrupt)?;
    // instruction + error + crc at minimum
    if length < 4 || frame.len() != PREFIX_LEN + length {
        return Err(CommResult::RxCorrupt);
    }

    let (covered, crc_bytes) = frame.split_at(frame.len() - 2);
    let expected = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    if crc16(covered) != expected {
        return Err(CommResult::RxCorrupt);
    }

    let body = unstuff(&covered[PREFIX_LEN..]);
    match body.as_slice() {
        [inst, error, params @ ..] if *inst == Instruction::Status as u8 => Ok(StatusPacket {
            id: frame[4],
            error: *error,
            params: params.to_vec(),
        }),
        _ => Err(CommResult::RxCorrupt),
    }
}
