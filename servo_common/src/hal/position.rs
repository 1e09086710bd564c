//! Position clamping and register encoding.
//!
//! Goal and present position registers hold 32-bit two's complement values
//! that travel over the bus as raw unsigned bytes.

use crate::hal::consts::{MAX_POSITION, MIN_POSITION};

/// Saturate a requested goal position into `[MIN_POSITION, MAX_POSITION]`.
///
/// Out-of-range requests are never rejected.
#[inline]
pub fn clamp_goal_position(requested: i64) -> i32 {
    requested.clamp(MIN_POSITION as i64, MAX_POSITION as i64) as i32
}

/// Encode a signed position as the raw register value.
#[inline]
pub const fn encode_position(position: i32) -> u32 {
    position as u32
}

/// Decode a raw register value as a signed position.
///
/// Values `>= 2^31` map to `value - 2^32`.
#[inline]
pub const fn decode_position(raw: u32) -> i32 {
    raw as i32
}
