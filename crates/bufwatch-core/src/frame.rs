#![forbid(unsafe_code)]

//! Trace frame codec.
//!
//! A binary frame is a sequence of big-endian `u32` fields:
//!
//! | offset | field                        |
//! |--------|------------------------------|
//! | 0      | relation file node           |
//! | 4      | block number                 |
//! | 8      | hit flag (`1` hit, `0` miss) |
//!
//! The hit flag is optional: an 8-byte frame is an unclassified access.
//! Every frame decodes independently and a frame is either fully valid or
//! rejected; there is no partial parse.
//!
//! The producer's line format ([`parse_hex_record`]) is 16 hex digits: eight
//! for the file node followed by eight for the block.

use std::fmt;

use crate::entity::EntityId;
use crate::trace::{Access, TraceEvent};

/// Length of a frame without a hit flag.
pub const FRAME_LEN: usize = 8;

/// Length of a frame carrying a hit flag.
pub const CLASSIFIED_FRAME_LEN: usize = 12;

const HEX_RECORD_LEN: usize = 16;

/// Frame decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Shorter than the minimum frame.
    Truncated { len: usize },
    /// Long enough, but neither of the two valid frame sizes.
    UnexpectedLength { len: usize },
    /// Hit flag was something other than 0 or 1.
    InvalidHitFlag { value: u32 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { len } => {
                write!(f, "truncated trace frame: {len} bytes, need {FRAME_LEN}")
            }
            Self::UnexpectedLength { len } => write!(
                f,
                "unexpected trace frame length {len} (expected {FRAME_LEN} or {CLASSIFIED_FRAME_LEN})"
            ),
            Self::InvalidHitFlag { value } => write!(f, "invalid hit flag {value}"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Decode one binary trace frame.
pub fn decode_frame(bytes: &[u8]) -> Result<TraceEvent, FrameError> {
    let len = bytes.len();
    if len < FRAME_LEN {
        return Err(FrameError::Truncated { len });
    }
    if len != FRAME_LEN && len != CLASSIFIED_FRAME_LEN {
        return Err(FrameError::UnexpectedLength { len });
    }

    let entity = EntityId(read_u32_be(bytes, 0));
    let block = read_u32_be(bytes, 4);
    let access = if len == CLASSIFIED_FRAME_LEN {
        let value = read_u32_be(bytes, 8);
        Access::from_flag(value).ok_or(FrameError::InvalidHitFlag { value })?
    } else {
        Access::Unclassified
    };

    Ok(TraceEvent::new(entity, block, access))
}

/// Encode an event as a binary frame (the producer side of [`decode_frame`]).
///
/// Unclassified events produce the short 8-byte form.
#[must_use]
pub fn encode_frame(event: &TraceEvent) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CLASSIFIED_FRAME_LEN);
    buf.extend_from_slice(&event.entity.0.to_be_bytes());
    buf.extend_from_slice(&event.block.to_be_bytes());
    if let Some(flag) = event.access.flag() {
        buf.extend_from_slice(&flag.to_be_bytes());
    }
    buf
}

/// Parse one line of the tracer's hex output.
///
/// Lines that are not exactly 16 hex digits (after trimming) are noise from
/// the tracer (banners, attach messages) and yield `None`.
#[must_use]
pub fn parse_hex_record(line: &str) -> Option<TraceEvent> {
    let line = line.trim();
    if line.len() != HEX_RECORD_LEN || !line.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let entity = u32::from_str_radix(&line[..8], 16).ok()?;
    let block = u32::from_str_radix(&line[8..], 16).ok()?;
    Some(TraceEvent::unclassified(EntityId(entity), block))
}

#[inline]
fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
