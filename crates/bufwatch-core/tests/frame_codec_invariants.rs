//! Property-based invariant tests for the trace frame codec.
//!
//! 1. Decoding arbitrary bytes never panics, and only 8- or 12-byte frames
//!    are ever accepted.
//! 2. A rejected frame reports the reason matching its length.
//! 3. Hex-record parsing never panics and only accepts 16 hex digits.

use bufwatch_core::{Access, FrameError, decode_frame, parse_hex_record};
use proptest::prelude::*;

proptest! {
    #[test]
    fn decode_accepts_only_frame_sizes(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        match decode_frame(&bytes) {
            Ok(event) => {
                prop_assert!(bytes.len() == 8 || bytes.len() == 12);
                prop_assert_eq!(event.access == Access::Unclassified, bytes.len() == 8);
                prop_assert_eq!(event.entity.0.to_be_bytes(), [bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            Err(FrameError::Truncated { len }) => prop_assert!(len < 8),
            Err(FrameError::UnexpectedLength { len }) => {
                prop_assert!(len > 8 && len != 12);
            }
            Err(FrameError::InvalidHitFlag { value }) => {
                prop_assert_eq!(bytes.len(), 12);
                prop_assert!(value > 1);
            }
        }
    }
}

proptest! {
    #[test]
    fn hex_records_parse_only_clean_lines(line in "\\PC{0,24}") {
        let trimmed = line.trim();
        let clean = trimmed.len() == 16 && trimmed.bytes().all(|b| b.is_ascii_hexdigit());
        prop_assert_eq!(parse_hex_record(&line).is_some(), clean);
    }
}

proptest! {
    #[test]
    fn hex_records_split_node_and_block(node in any::<u32>(), block in any::<u32>()) {
        let line = format!("  {node:08x}{block:08X}\n");
        let event = parse_hex_record(&line).unwrap();
        prop_assert_eq!(event.entity.0, node);
        prop_assert_eq!(event.block, block);
        prop_assert_eq!(event.access, Access::Unclassified);
    }
}
