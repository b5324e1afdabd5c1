//! Presence (attach/detach) decoding.
//!
//! The `A0` frame is out-of-band: it never joins a burst and reports the
//! physical state of the pass (whether a bey sits on the launcher, plus a
//! few lifetime statistics). Transitions between consecutive raw presence
//! bytes carry the actual meaning, so the tracker keeps the previous byte
//! for the whole life of the connection.
//!
//! Frame layout:
//! ```text
//! offset  width  content
//!      0      1  A0 (tag)
//!      1      1  always 3A
//!      3      1  raw presence byte
//!      7      2  max recorded shot power
//!      9      2  lifetime shot counter
//!     11      6  unique pass ID
//! ```

use crate::error::Result;
use crate::frame::Frame;

/// Bit set in the raw presence byte while a bey sits on the launcher.
const ATTACHED_BIT: u8 = 0x04;

// ---------------------------------------------------------------------------
// Transition codes
// ---------------------------------------------------------------------------

/// A presence transition: previous raw byte in the high half of the code,
/// current byte in the low half.
///
/// Six transitions have device-defined meaning. Everything else is legal
/// but undefined and passes through as [`PresenceCode::Unknown`]; the
/// device firmware is free to grow new states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PresenceCode {
    /// `00 -> 04`: a bey was seated on the launcher.
    BeyAttached,
    /// `04 -> 00`: the bey left the launcher (launched or removed).
    BeyDetached,
    /// `00 -> 10`: double-click with no bey; electric launcher armed.
    ElectricLauncherEnabled,
    /// `10 -> 00`: electric launcher disarmed.
    ElectricLauncherDisabled,
    /// `10 -> 14`: bey seated while armed; shoot order issued.
    ShootOrdered,
    /// `14 -> 10`: bey removed while a shoot order was pending.
    ShootCanceled,
    /// Any other transition, raw code preserved.
    Unknown(u16),
}

impl PresenceCode {
    /// Classify a raw transition code.
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0004 => Self::BeyAttached,
            0x0400 => Self::BeyDetached,
            0x0010 => Self::ElectricLauncherEnabled,
            0x1000 => Self::ElectricLauncherDisabled,
            0x1014 => Self::ShootOrdered,
            0x1410 => Self::ShootCanceled,
            other => Self::Unknown(other),
        }
    }

    /// The raw transition code, `(prev << 8) | current`.
    pub fn code(self) -> u16 {
        match self {
            Self::BeyAttached => 0x0004,
            Self::BeyDetached => 0x0400,
            Self::ElectricLauncherEnabled => 0x0010,
            Self::ElectricLauncherDisabled => 0x1000,
            Self::ShootOrdered => 0x1014,
            Self::ShootCanceled => 0x1410,
            Self::Unknown(code) => code,
        }
    }

    /// Whether a bey sits on the launcher after this transition.
    pub fn is_attached(self) -> bool {
        (self.code() as u8) & ATTACHED_BIT != 0
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Edge detector over consecutive raw presence bytes.
///
/// The previous byte tracks the physical device across its entire connected
/// lifetime: it survives bursts and burst errors, and is never cleared.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    prev: u8,
}

impl PresenceTracker {
    /// Fold in the next raw presence byte and emit the transition code.
    pub fn observe(&mut self, current: u8) -> PresenceCode {
        let code = (u16::from(self.prev) << 8) | u16::from(current);
        self.prev = current;
        PresenceCode::from_code(code)
    }
}

// ---------------------------------------------------------------------------
// Full frame decode
// ---------------------------------------------------------------------------

/// Everything an `A0` frame reports beyond the presence byte itself.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PresenceReport {
    /// Raw presence byte.
    pub presence: u8,
    /// Maximum shot power ever recorded on the pass (rpm).
    pub max_recorded_sp: u16,
    /// Lifetime shot counter.
    pub total_shots: u16,
    /// Unique pass ID.
    pub pass_id: [u8; 6],
}

impl PresenceReport {
    /// Decode a presence frame.
    pub fn decode(frame: &Frame) -> Result<Self> {
        let b = frame.as_bytes();
        Ok(Self {
            presence: b[3],
            max_recorded_sp: frame.uint16(7)?,
            total_shots: frame.uint16(9)?,
            pass_id: [b[11], b[12], b[13], b[14], b[15], b[16]],
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
