//! Top-level decoder: one instance per connected Battle Pass.
//!
//! Frames arrive one at a time from the transport's notification callback
//! and are fed to [`Decoder::ingest`]. Presence frames are handled out of
//! band; everything else accumulates in the burst buffer until the end
//! sentinel triggers validation and extraction. After a `Finished` result
//! the caller may run [`Decoder::analyze_profile`] any number of times
//! before clearing.
//!
//! Single-writer: the caller serializes `ingest` calls and does not overlap
//! them with the read side. Nothing here blocks; an incomplete burst that
//! never terminates is the caller's timeout to handle, via [`Decoder::clear`].

use tracing::debug;

use crate::burst::BurstBuffer;
use crate::error::{DecodeError, Result};
use crate::frame::{Frame, TAG_BURST_END, TAG_PRESENCE};
use crate::presence::{PresenceCode, PresenceReport, PresenceTracker};
use crate::profile::{self, ProfileAnalysis};

/// Outcome of feeding one frame to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The burst is still accumulating.
    Collecting,
    /// The burst completed and validated; results are readable.
    Finished,
    /// An out-of-band presence transition.
    Presence(PresenceCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Collecting,
    Finished,
}

/// Decodes the notification stream of one Battle Pass.
#[derive(Debug, Default)]
pub struct Decoder {
    burst: BurstBuffer,
    tracker: PresenceTracker,
    phase: Phase,
    bbp_sp: u16,
    true_sp: u16,
    max_sp: u16,
    last_presence: Option<PresenceReport>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame.
    ///
    /// Presence frames update the tracker and return immediately. All other
    /// frames join the burst; the end sentinel (which is itself the 4th
    /// profile frame, and is stored first) triggers completeness and
    /// checksum validation, then shot-power extraction. Every error clears
    /// the burst; the device sends a fresh one on the next launch.
    pub fn ingest(&mut self, frame: &Frame) -> Result<Ingest> {
        if frame.tag() == TAG_PRESENCE {
            let report = PresenceReport::decode(frame)?;
            let code = self.tracker.observe(report.presence);
            debug!(code = code.code(), "presence transition");
            self.last_presence = Some(report);
            return Ok(Ingest::Presence(code));
        }

        self.burst.insert(*frame);
        if frame.tag() != TAG_BURST_END {
            // New data invalidates a finished read view.
            self.phase = Phase::Collecting;
            return Ok(Ingest::Collecting);
        }

        match self.complete_burst() {
            Ok(sp) => {
                self.bbp_sp = sp;
                self.phase = Phase::Finished;
                debug!(bbp_sp = sp, "burst validated");
                Ok(Ingest::Finished)
            }
            Err(e) => {
                self.burst.clear();
                self.phase = Phase::Collecting;
                Err(e)
            }
        }
    }

    fn complete_burst(&self) -> Result<u16> {
        self.burst.validate()?;
        self.burst.latest_sp()
    }

    /// Run the rotation-profile analysis on the validated burst.
    ///
    /// Pure with respect to the buffered frames: repeated calls return the
    /// same result until new frames arrive or the burst is cleared.
    pub fn analyze_profile(&mut self) -> Result<ProfileAnalysis> {
        if self.phase != Phase::Finished {
            return Err(DecodeError::NotFinished);
        }
        let frames = self.burst.profile_frames()?;
        let analysis = profile::analyze(&frames, self.bbp_sp)?;
        self.true_sp = analysis.true_sp;
        self.max_sp = analysis.max_sp;
        Ok(analysis)
    }

    /// Discard the buffered burst. Call after reading results, or to
    /// recover from an external timeout. Last-shot outputs are kept so a
    /// display can keep showing them between launches.
    pub fn clear(&mut self) {
        self.burst.clear();
        self.phase = Phase::Collecting;
    }

    /// Shot power as recorded by the pass (rpm).
    pub fn bbp_sp(&self) -> u16 {
        self.bbp_sp
    }

    /// Corrected shot-power estimate from the last analysis (rpm).
    pub fn true_sp(&self) -> u16 {
        self.true_sp
    }

    /// Maximum profile speed from the last analysis (rpm).
    pub fn max_sp(&self) -> u16 {
        self.max_sp
    }

    /// The most recent presence frame, fully decoded.
    pub fn last_presence(&self) -> Option<&PresenceReport> {
        self.last_presence.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
