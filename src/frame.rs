//! The fixed 17-byte Battle Pass notification frame and its tag space.
//!
//! Wire format:
//! ```text
//! TAG PAYLOAD[16]
//! ```
//!
//! Byte 0 is the type tag; the remaining 16 bytes are interpreted per tag as
//! 8-bit values or little-endian 16-bit pairs. The tag space is closed:
//!
//! - `A0` — presence (attach/detach), out-of-band, never part of a burst
//! - `B0`-`B6` — shot-power list, 7 frames
//! - `B7` — checksum over the list frames
//! - `70`-`73` — rotation profile, 4 frames

use crate::codec;
use crate::error::{DecodeError, Result};

/// Frame length on the wire, tag byte included.
pub const FRAME_LEN: usize = 17;

/// Out-of-band presence frame.
pub const TAG_PRESENCE: u8 = 0xA0;
/// First shot-power list frame (slots #1-#8).
pub const TAG_LIST_FIRST: u8 = 0xB0;
/// Last shot-power list frame (slots #49/#50 plus metadata).
pub const TAG_LIST_LAST: u8 = 0xB6;
/// Checksum frame; payload byte 16 holds the sum of the list payloads.
pub const TAG_CHECKSUM: u8 = 0xB7;
/// First rotation-profile frame (samples #1-#8).
pub const TAG_PROFILE_FIRST: u8 = 0x70;
/// Last rotation-profile frame (samples #25-#32).
pub const TAG_PROFILE_LAST: u8 = 0x73;

/// End-of-burst sentinel. The device reuses the 4th profile tag as the
/// burst terminator, so the terminal frame carries real samples and must be
/// stored before completion is signalled.
pub const TAG_BURST_END: u8 = TAG_PROFILE_LAST;

/// An immutable 17-byte notification frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Build a frame from a tag and 16 payload bytes.
    pub fn new(tag: u8, payload: [u8; FRAME_LEN - 1]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = tag;
        bytes[1..].copy_from_slice(&payload);
        Self { bytes }
    }

    /// Capture a frame from raw notification bytes (exactly 17 of them).
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let bytes: [u8; FRAME_LEN] = raw
            .try_into()
            .map_err(|_| DecodeError::FrameLength { got: raw.len() })?;
        Ok(Self { bytes })
    }

    /// The type tag (byte 0).
    pub fn tag(&self) -> u8 {
        self.bytes[0]
    }

    /// All 17 bytes, tag included.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Little-endian 16-bit value at byte `offset` (1..=15).
    pub fn uint16(&self, offset: usize) -> Result<u16> {
        codec::read_uint16(&self.bytes, offset)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_exact_length() {
        let mut raw = [0u8; FRAME_LEN];
        raw[0] = TAG_CHECKSUM;
        raw[16] = 0x42;
        let frame = Frame::from_bytes(&raw).unwrap();
        assert_eq!(frame.tag(), TAG_CHECKSUM);
        assert_eq!(frame.as_bytes()[16], 0x42);
    }

    #[test]
    fn reject_short_and_long() {
        assert!(matches!(
            Frame::from_bytes(&[0xA0; 16]),
            Err(DecodeError::FrameLength { got: 16 })
        ));
        assert!(matches!(
            Frame::from_bytes(&[0xA0; 20]),
            Err(DecodeError::FrameLength { got: 20 })
        ));
    }

    #[test]
    fn uint16_reads_little_endian_pairs() {
        let mut payload = [0u8; 16];
        payload[0] = 0x88; // frame offset 1
        payload[1] = 0x13; // frame offset 2
        let frame = Frame::new(TAG_LIST_FIRST, payload);
        assert_eq!(frame.uint16(1).unwrap(), 5000);
    }

    #[test]
    fn uint16_at_last_pair() {
        let mut payload = [0u8; 16];
        payload[14] = 0x10; // frame offset 15
        payload[15] = 0x27; // frame offset 16
        let frame = Frame::new(TAG_LIST_FIRST, payload);
        assert_eq!(frame.uint16(15).unwrap(), 10_000);
    }

    #[test]
    fn sentinel_is_last_profile_tag() {
        // Protocol quirk: one tag value serves as both the 4th profile
        // frame and the end-of-burst marker.
        assert_eq!(TAG_BURST_END, TAG_PROFILE_LAST);
    }
}
