//! Host/board wire format.
//!
//! The host writes one byte per transaction: the dilution duration (0..=255).
//! The board answers with eight bytes, the transmit and receive intensities,
//! each a 4-byte group sent least-significant byte first. Reversing a group
//! and reading it big-endian gives the value.

use crate::error::{Result, TurbidostatError};
use crate::types::RawReading;

/// Length of the board's reply.
pub const FRAME_LEN: usize = 8;

/// Largest dilution command the board accepts.
pub const MAX_COMMAND: u8 = u8::MAX;

/// Encode a dilution duration as the command byte.
///
/// Durations above 255 are capped. Negative durations are a no-op and yield
/// `None`; the caller must skip the transaction entirely.
#[inline]
pub fn encode_command(duration: i64) -> Option<u8> {
    if duration < 0 {
        return None;
    }
    Some(u8::try_from(duration).unwrap_or(MAX_COMMAND))
}

/// Decode the board's 8-byte reply into a (tx, rx) pair.
///
/// Bytes `[0..4)` are `tx` and `[4..8)` are `rx`. Bytes past the eighth are
/// ignored; fewer than eight is `ShortRead`.
pub fn decode_reading(buf: &[u8]) -> Result<RawReading> {
    if buf.len() < FRAME_LEN {
        return Err(TurbidostatError::ShortRead(buf.len()));
    }
    Ok(RawReading {
        tx: group(&buf[0..4]),
        rx: group(&buf[4..8]),
    })
}

/// Reverse a 4-byte group and interpret it big-endian.
#[inline]
fn group(bytes: &[u8]) -> u32 {
    let mut g = [0u8; 4];
    g.copy_from_slice(bytes);
    g.reverse();
    u32::from_be_bytes(g)
}

/// Encode a (tx, rx) pair the way the board sends it. Used by simulators and
/// test fixtures.
pub fn encode_reading(reading: RawReading) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&reading.tx.to_le_bytes());
    frame[4..].copy_from_slice(&reading.rx.to_le_bytes());
    frame
}
