//! Rotation-profile reconstruction and true shot-power estimation.
//!
//! Each profile sample is a reflection count: how many 8 µs optical-sensor
//! ticks one rotation of the launcher took. From those the pull is rebuilt
//! as an `(elapsed_ms, speed_rpm)` series, and a peak-detection heuristic
//! rejects the spurious late spike a string launcher produces when the cord
//! snaps free of the bey.
//!
//! The device's own recorded value is treated as a trusted upper bound: the
//! corrected estimate never exceeds it.

use crate::error::Result;
use crate::frame::{FRAME_LEN, Frame};

/// Maximum number of samples across the four profile frames.
pub const PROFILE_CAPACITY: usize = 32;

/// Below this many valid samples no extrapolation is attempted.
const MIN_SAMPLES: usize = 7;

/// First index the peak scan considers (four points of lead-in needed).
const SCAN_FIRST: usize = 4;

/// The scan never looks past this many samples; the pull is over by then.
const SCAN_WINDOW: usize = 14;

/// Sensor tick rate: 8 µs per reflection, so 125 counts per millisecond.
const COUNTS_PER_MS: f64 = 125.0;

/// Allowance applied to the extrapolated speed in the rebound check.
const REBOUND_MARGIN: f64 = 1.04;

/// Points fed to the launch-acceleration regression.
const ACCEL_POINTS: usize = 9;

/// One reconstructed profile point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProfilePoint {
    /// Time since the start of the pull (ms).
    pub elapsed_ms: u32,
    /// Rotational speed over that rotation (rpm).
    pub speed_rpm: u16,
}

/// Outcome of a profile analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProfileAnalysis {
    /// Corrected shot-power estimate (rpm).
    pub true_sp: u16,
    /// Maximum speed seen anywhere in the profile (rpm).
    pub max_sp: u16,
    /// Least-squares speed slope over the first nine points (rpm/ms).
    /// `None` when the profile is too short.
    pub accel: Option<f64>,
}

impl ProfileAnalysis {
    /// SP a constant-acceleration pull would reach, `sqrt(24 * 60000 * a)`.
    pub fn expected_sp(&self) -> Option<u16> {
        match self.accel {
            Some(a) if a > 0.0 => Some((24.0 * 60_000.0 * a).sqrt() as u16),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Analyze the four profile frames of a validated burst.
///
/// Pure: the same frames and `bbp_sp` always produce the same result.
pub fn analyze(frames: &[Frame; 4], bbp_sp: u16) -> Result<ProfileAnalysis> {
    let mut points: Vec<ProfilePoint> = Vec::with_capacity(PROFILE_CAPACITY);
    let mut elapsed: u32 = 0;
    let mut max_sp: u16 = 0;

    for frame in frames {
        for offset in (1..FRAME_LEN).step_by(2) {
            let refs = frame.uint16(offset)?;
            // 0 marks a sensor overflow: no time passes, no point appended.
            if refs == 0 {
                continue;
            }
            let dt_ms = f64::from(refs) / COUNTS_PER_MS;
            let speed = (60_000.0 / dt_ms).round() as u16;
            elapsed += dt_ms.round() as u32;
            points.push(ProfilePoint {
                elapsed_ms: elapsed,
                speed_rpm: speed,
            });
            max_sp = max_sp.max(speed);
        }
    }

    let accel = accel_estimate(&points);

    // Too little data to place a peak: trust the recorded value outright.
    if points.len() < MIN_SAMPLES {
        return Ok(ProfileAnalysis {
            true_sp: bbp_sp,
            max_sp,
            accel,
        });
    }

    let count = points.len();
    let end = count.min(SCAN_WINDOW);
    let mut peak: Option<usize> = None;

    for i in SCAN_FIRST..end {
        if points[i - 1].speed_rpm <= points[i].speed_rpm {
            continue;
        }
        // A decline started at `i`; confirm it keeps falling before
        // committing to `i - 1` as the peak.
        if i + 2 < count {
            if points[i].speed_rpm > points[i + 1].speed_rpm
                && points[i + 1].speed_rpm > points[i + 2].speed_rpm
            {
                peak = Some(check_rebound(&points, i));
                break;
            }
        } else if i + 1 < count {
            if points[i].speed_rpm > points[i + 1].speed_rpm {
                peak = Some(check_rebound(&points, i));
                break;
            }
        } else {
            // Nothing beyond `i` to confirm with; accept directly.
            peak = Some(i - 1);
            break;
        }
    }

    let (peak_idx, candidate) = match peak {
        Some(idx) => (idx, points[idx].speed_rpm),
        // The window ended mid-rise; take the profile maximum.
        None => (end - 1, max_sp),
    };

    // The recorded value bounds the estimate from above, and a peak inside
    // the first four points has no lead-in to extrapolate from.
    let true_sp = if peak_idx < SCAN_FIRST || candidate > bbp_sp {
        bbp_sp
    } else {
        candidate
    };

    Ok(ProfileAnalysis {
        true_sp,
        max_sp,
        accel,
    })
}

/// Decide whether the candidate peak at `i - 1` is a cord-release rebound.
///
/// Extrapolates the pull's trend through points `i-4` and `i-2` to the
/// candidate's timestamp with a 4% allowance. A reading above that line did
/// not come from the pull, so the point before the artifact is the peak.
fn check_rebound(points: &[ProfilePoint], i: usize) -> usize {
    let t = |k: usize| f64::from(points[k].elapsed_ms);
    let s = |k: usize| f64::from(points[k].speed_rpm);

    let slope = (s(i - 2) - s(i - 4)) / (t(i - 2) - t(i - 4));
    let ext = REBOUND_MARGIN * (slope * (t(i - 1) - t(i - 2)) + s(i - 2));
    if ext < s(i - 1) { i - 2 } else { i - 1 }
}

/// Least-squares speed-over-time slope across the first nine points.
fn accel_estimate(points: &[ProfilePoint]) -> Option<f64> {
    if points.len() < ACCEL_POINTS {
        return None;
    }
    let n = ACCEL_POINTS as f64;
    let (mut sx, mut sy, mut sxy, mut sx2) = (0.0, 0.0, 0.0, 0.0);
    for p in &points[..ACCEL_POINTS] {
        let x = f64::from(p.elapsed_ms);
        let y = f64::from(p.speed_rpm);
        sx += x;
        sy += y;
        sxy += x * y;
        sx2 += x * x;
    }
    let denom = n * sx2 - sx * sx;
    if denom == 0.0 {
        return None;
    }
    Some((n * sxy - sx * sy) / denom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
