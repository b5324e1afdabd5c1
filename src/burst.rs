//! Latest-wins burst reassembly and validation.
//!
//! One burst is the full telemetry read for a single launch: 7 shot-power
//! list frames, 1 checksum frame, and 4 rotation-profile frames. Frames are
//! keyed by tag and overwrite on repeat; the device retransmits rather
//! than appends.
//!
//! List layout (LE u16 slots, stride 2 from offset 1):
//! ```text
//! offset   B0   B1   B2   B3   B4   B5   B6
//!      1   #1   #9  #17  #25  #33  #41  #49
//!      3   #2  #10  #18  #26  #34  #42  #50
//!      5   #3  #11  #19  #27  #35  #43    -
//!      7   #4  #12  #20  #28  #36  #44   max recorded SP
//!      9   #5  #13  #21  #29  #37  #45   total shot counter
//!     11   #6  #14  #22  #30  #38  #46   list shot counter
//!     13   #7  #15  #23  #31  #39  #47    -
//!     15   #8  #16  #24  #32  #40  #48    -
//! ```

use tracing::warn;

use crate::error::{DecodeError, Result};
use crate::frame::{
    Frame, TAG_CHECKSUM, TAG_LIST_FIRST, TAG_LIST_LAST, TAG_PROFILE_FIRST, TAG_PROFILE_LAST,
};

/// Number of shot-power slots across the list frames.
pub const LIST_SLOTS: u8 = 50;

/// Slots per list frame (the last frame holds only 2).
const SLOTS_PER_FRAME: usize = 8;

/// Offset of the list shot counter in the last list frame.
const LIST_COUNTER_OFFSET: usize = 11;

/// Offset of the checksum byte in the checksum frame.
const CHECKSUM_OFFSET: usize = 16;

const NUM_LIST: usize = (TAG_LIST_LAST - TAG_LIST_FIRST + 1) as usize;
const NUM_PROFILE: usize = (TAG_PROFILE_LAST - TAG_PROFILE_FIRST + 1) as usize;

/// Buffers the frames of one telemetry read, keyed by tag.
#[derive(Debug, Default)]
pub struct BurstBuffer {
    list: [Option<Frame>; NUM_LIST],
    checksum: Option<Frame>,
    profile: [Option<Frame>; NUM_PROFILE],
}

impl BurstBuffer {
    /// Store a frame at its tag slot, overwriting any earlier arrival.
    ///
    /// Tags outside the burst map are dropped; nothing downstream reads
    /// them.
    pub fn insert(&mut self, frame: Frame) {
        match frame.tag() {
            tag @ TAG_LIST_FIRST..=TAG_LIST_LAST => {
                self.list[usize::from(tag - TAG_LIST_FIRST)] = Some(frame);
            }
            TAG_CHECKSUM => self.checksum = Some(frame),
            tag @ TAG_PROFILE_FIRST..=TAG_PROFILE_LAST => {
                self.profile[usize::from(tag - TAG_PROFILE_FIRST)] = Some(frame);
            }
            tag => warn!(tag, "frame outside the burst tag space, dropped"),
        }
    }

    /// Discard all buffered frames.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check completeness, then verify the list checksum.
    ///
    /// The checksum is the byte sum of payload offsets 1..=16 across all 7
    /// list frames, mod 256, compared to byte 16 of the checksum frame.
    pub fn validate(&self) -> Result<()> {
        let mut sum: u32 = 0;
        for (i, slot) in self.list.iter().enumerate() {
            let frame = slot.ok_or(DecodeError::MissingFrame {
                tag: TAG_LIST_FIRST + i as u8,
            })?;
            sum += frame.as_bytes()[1..].iter().map(|&b| u32::from(b)).sum::<u32>();
        }
        let checksum = self.checksum.ok_or(DecodeError::MissingFrame {
            tag: TAG_CHECKSUM,
        })?;
        for (i, slot) in self.profile.iter().enumerate() {
            if slot.is_none() {
                return Err(DecodeError::MissingFrame {
                    tag: TAG_PROFILE_FIRST + i as u8,
                });
            }
        }

        let expected = checksum.as_bytes()[CHECKSUM_OFFSET];
        let computed = (sum & 0xFF) as u8;
        if computed != expected {
            warn!(expected, computed, "list checksum mismatch");
            return Err(DecodeError::ChecksumMismatch { expected, computed });
        }
        Ok(())
    }

    /// Locate and read the newest shot-power slot.
    ///
    /// The list shot counter `n` names the slot of the most recent launch.
    /// Slot `n` lives in frame `B0 + ((n-1) / 8)` at payload offset
    /// `((n-1) % 8) * 2 + 1`.
    pub fn latest_sp(&self) -> Result<u16> {
        let last = self.list[NUM_LIST - 1].ok_or(DecodeError::MissingFrame {
            tag: TAG_LIST_LAST,
        })?;
        let n = last.as_bytes()[LIST_COUNTER_OFFSET];
        if !(1..=LIST_SLOTS).contains(&n) {
            warn!(n, "shot-list counter out of range");
            return Err(DecodeError::ShotIndexOutOfRange { n });
        }

        let slot = usize::from(n - 1);
        let frame = self.list[slot / SLOTS_PER_FRAME].ok_or(DecodeError::MissingFrame {
            tag: TAG_LIST_FIRST + (slot / SLOTS_PER_FRAME) as u8,
        })?;
        frame.uint16((slot % SLOTS_PER_FRAME) * 2 + 1)
    }

    /// The four profile frames, in tag order.
    pub fn profile_frames(&self) -> Result<[Frame; NUM_PROFILE]> {
        let get = |i: usize| {
            self.profile[i].ok_or(DecodeError::MissingFrame {
                tag: TAG_PROFILE_FIRST + i as u8,
            })
        };
        Ok([get(0)?, get(1)?, get(2)?, get(3)?])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    /// A burst with all 12 frames present and a consistent checksum.
    /// `slots` places LE u16 values at (list tag, frame offset).
    fn filled_burst(n: u8, slots: &[(u8, usize, u16)]) -> BurstBuffer {
        let mut burst = BurstBuffer::default();
        let mut payloads = [[0u8; 16]; NUM_LIST];
        payloads[NUM_LIST - 1][LIST_COUNTER_OFFSET - 1] = n;
        for &(tag, offset, value) in slots {
            let idx = usize::from(tag - TAG_LIST_FIRST);
            codec::put_uint16(&mut payloads[idx], offset - 1, value);
        }

        let mut sum: u32 = 0;
        for (i, payload) in payloads.iter().enumerate() {
            sum += payload.iter().map(|&b| u32::from(b)).sum::<u32>();
            burst.insert(Frame::new(TAG_LIST_FIRST + i as u8, *payload));
        }
        let mut cs = [0u8; 16];
        cs[CHECKSUM_OFFSET - 1] = (sum & 0xFF) as u8;
        burst.insert(Frame::new(TAG_CHECKSUM, cs));

        for tag in TAG_PROFILE_FIRST..=TAG_PROFILE_LAST {
            burst.insert(Frame::new(tag, [0u8; 16]));
        }
        burst
    }

    #[test]
    fn checksum_accepts_consistent_burst() {
        let burst = filled_burst(1, &[(0xB0, 1, 5000)]);
        assert!(burst.validate().is_ok());
    }

    #[test]
    fn checksum_rejects_flipped_byte() {
        let mut burst = filled_burst(1, &[(0xB0, 1, 5000)]);
        // Re-insert B3 with a corrupted payload; the checksum frame stays.
        let mut corrupt = [0u8; 16];
        corrupt[4] = 1;
        burst.insert(Frame::new(0xB3, corrupt));
        assert!(matches!(
            burst.validate(),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn missing_list_frame_is_flagged() {
        let mut burst = filled_burst(1, &[]);
        burst.list[3] = None;
        assert!(matches!(
            burst.validate(),
            Err(DecodeError::MissingFrame { tag: 0xB3 })
        ));
    }

    #[test]
    fn missing_profile_frame_is_flagged() {
        let mut burst = filled_burst(1, &[]);
        burst.profile[1] = None;
        assert!(matches!(
            burst.validate(),
            Err(DecodeError::MissingFrame { tag: 0x71 })
        ));
    }

    #[test]
    fn slot_addressing_first_slot() {
        // n = 1 reads offset 1 of the first list frame.
        let burst = filled_burst(1, &[(0xB0, 1, 6100)]);
        assert_eq!(burst.latest_sp().unwrap(), 6100);
    }

    #[test]
    fn slot_addressing_frame_boundary() {
        // n = 8 reads offset 15 of the first list frame,
        // n = 9 reads offset 1 of the second.
        let burst = filled_burst(8, &[(0xB0, 15, 7200), (0xB1, 1, 300)]);
        assert_eq!(burst.latest_sp().unwrap(), 7200);
        let burst = filled_burst(9, &[(0xB0, 15, 300), (0xB1, 1, 7300)]);
        assert_eq!(burst.latest_sp().unwrap(), 7300);
    }

    #[test]
    fn slot_addressing_last_slot() {
        // n = 50 reads slot #50: offset 3 of the last list frame.
        let burst = filled_burst(50, &[(0xB6, 3, 8400)]);
        assert_eq!(burst.latest_sp().unwrap(), 8400);
    }

    #[test]
    fn counter_out_of_range() {
        for n in [0u8, 51, 255] {
            let burst = filled_burst(n, &[]);
            assert!(matches!(
                burst.latest_sp(),
                Err(DecodeError::ShotIndexOutOfRange { n: got }) if got == n
            ));
        }
    }

    #[test]
    fn latest_wins_overwrite() {
        let mut burst = filled_burst(1, &[(0xB0, 1, 1111)]);
        let mut payload = [0u8; 16];
        codec::put_uint16(&mut payload, 0, 2222);
        burst.insert(Frame::new(0xB0, payload));
        assert_eq!(burst.latest_sp().unwrap(), 2222);
    }

    #[test]
    fn clear_discards_everything() {
        let mut burst = filled_burst(1, &[]);
        burst.clear();
        assert!(matches!(
            burst.validate(),
            Err(DecodeError::MissingFrame { tag: 0xB0 })
        ));
    }
}
