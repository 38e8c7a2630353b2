//! Piecewise-Linear Calibration from Raw Sensor Units to Liters
//!
//! ## Motivation
//!
//! The tank sender is a resistive float whose analog reading is neither linear
//! in fuel volume nor zero-based. The tank shape is captured once, on a test
//! bench, as a handful of known `(raw, liters)` pairs. Everything between two
//! pairs is interpolated linearly; everything beyond the outermost pairs is
//! saturated to the outermost liters value.
//!
//! ## Reference Table
//!
//! ```text
//! raw units   5836 ────── 4464 ────── 2561 ─────────── 477
//! liters         0          20          40               70
//!              empty                                    full
//!
//! raw >= 5836           → 0 L   (saturate)
//! raw in (4464, 5836]   → linear 0..20 L
//! raw in (2561, 4464]   → linear 20..40 L
//! raw in (477, 2561]    → linear 40..70 L
//! raw <= 477            → 70 L  (saturate)
//! ```
//!
//! Higher raw readings mean *less* fuel, so the curve is monotonically
//! non-increasing in the raw value.
//!
//! ## Interpolation
//!
//! Each segment is half-open, `(lo, hi]`, and is evaluated from its closed
//! end:
//!
//! ```text
//! liters(raw) = l_hi + (raw - r_hi) * (l_lo - l_hi) / (r_lo - r_hi)
//! ```
//!
//! Anchoring at `hi` makes a raw value sitting exactly on a breakpoint return
//! that breakpoint's liters value bit-for-bit, so threshold ties never depend
//! on floating-point rounding. All arithmetic is `f64`; nothing is rounded
//! between segments.
//!
//! ## Validation
//!
//! A table is checked once, when it is built. Defects that would otherwise
//! surface as a division by zero or a non-monotonic lookup at query time are
//! reported as [`CalibrationError`]s:
//!
//! - fewer than two breakpoints
//! - a NaN or infinite liters value
//! - two breakpoints sharing a raw threshold
//! - thresholds that change direction
//!
//! Breakpoints may be supplied in ascending or descending raw order (the
//! reference table is written empty-to-full, i.e. descending raw); they are
//! stored ascending.

use std::sync::Arc;

use crate::errors::{CalibrationError, CalibrationResult};
use crate::samples::{CalibratedSample, RawSample};

/// One known `(raw, liters)` correspondence
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalibrationBreakpoint {
    /// Sensor reading at this point
    pub raw_threshold: u16,
    /// Volume at this point
    pub liters_at_threshold: f64,
}

impl CalibrationBreakpoint {
    /// Create a breakpoint
    pub const fn new(raw_threshold: u16, liters_at_threshold: f64) -> Self {
        Self { raw_threshold, liters_at_threshold }
    }
}

/// Bench-measured curve of the 70 L reference tank, empty to full
pub const REFERENCE_BREAKPOINTS: [CalibrationBreakpoint; 4] = [
    CalibrationBreakpoint::new(5836, 0.0),
    CalibrationBreakpoint::new(4464, 20.0),
    CalibrationBreakpoint::new(2561, 40.0),
    CalibrationBreakpoint::new(477, 70.0),
];

/// Name of the reference table
pub const REFERENCE_TABLE_NAME: &str = "tank_70l";

/// Version of the reference table
pub const REFERENCE_TABLE_VERSION: u32 = 1;

/// Validated, immutable breakpoint table
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    name: String,
    version: u32,
    /// Strictly ascending by raw threshold
    breakpoints: Vec<CalibrationBreakpoint>,
}

impl CalibrationTable {
    /// Smallest table that can interpolate
    pub const MIN_BREAKPOINTS: usize = 2;

    /// Validate and build a table
    pub fn new(
        name: impl Into<String>,
        version: u32,
        breakpoints: &[CalibrationBreakpoint],
    ) -> CalibrationResult<Self> {
        if breakpoints.len() < Self::MIN_BREAKPOINTS {
            return Err(CalibrationError::TooFewBreakpoints {
                required: Self::MIN_BREAKPOINTS,
                available: breakpoints.len(),
            });
        }

        if let Some(index) = breakpoints
            .iter()
            .position(|bp| !bp.liters_at_threshold.is_finite())
        {
            return Err(CalibrationError::NonFiniteLiters { index });
        }

        let ascending = check_direction(breakpoints)?;

        let mut sorted = breakpoints.to_vec();
        if !ascending {
            sorted.reverse();
        }

        Ok(Self {
            name: name.into(),
            version,
            breakpoints: sorted,
        })
    }

    /// The 70 L reference tank table
    pub fn reference() -> Self {
        let mut breakpoints = REFERENCE_BREAKPOINTS.to_vec();
        breakpoints.reverse();
        Self {
            name: REFERENCE_TABLE_NAME.into(),
            version: REFERENCE_TABLE_VERSION,
            breakpoints,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Breakpoints in ascending raw order
    pub fn breakpoints(&self) -> &[CalibrationBreakpoint] {
        &self.breakpoints
    }

    /// Map a raw reading to liters. Total over `u16`.
    pub fn lookup(&self, raw: u16) -> f64 {
        let bps = &self.breakpoints;
        let first = bps[0];
        let last = bps[bps.len() - 1];

        if raw <= first.raw_threshold {
            return first.liters_at_threshold;
        }
        if raw >= last.raw_threshold {
            return last.liters_at_threshold;
        }

        // First breakpoint at or above `raw`; 1..len-1 after the saturation checks
        let hi_idx = bps.partition_point(|bp| bp.raw_threshold < raw);
        let lo = bps[hi_idx - 1];
        let hi = bps[hi_idx];

        interpolate(lo, hi, raw)
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::reference()
    }
}

/// Returns `true` for ascending thresholds, `false` for descending
fn check_direction(breakpoints: &[CalibrationBreakpoint]) -> CalibrationResult<bool> {
    let mut ascending = None;

    for (index, pair) in breakpoints.windows(2).enumerate() {
        let (prev, next) = (pair[0].raw_threshold, pair[1].raw_threshold);
        if prev == next {
            return Err(CalibrationError::DuplicateThreshold { raw: next });
        }

        let step_up = next > prev;
        match ascending {
            None => ascending = Some(step_up),
            Some(dir) if dir != step_up => {
                return Err(CalibrationError::NotMonotonic { index: index + 1 });
            }
            Some(_) => {}
        }
    }

    Ok(ascending.unwrap_or(true))
}

/// Linear interpolation on `(lo, hi]`, evaluated from `hi`
fn interpolate(lo: CalibrationBreakpoint, hi: CalibrationBreakpoint, raw: u16) -> f64 {
    let raw_span = f64::from(lo.raw_threshold) - f64::from(hi.raw_threshold);
    let liters_span = lo.liters_at_threshold - hi.liters_at_threshold;
    let offset = f64::from(raw) - f64::from(hi.raw_threshold);

    hi.liters_at_threshold + offset * liters_span / raw_span
}

/// Converts raw samples to liters against a shared table.
///
/// Stateless and cheap to clone; independent samples may be calibrated from
/// any number of threads.
#[derive(Debug, Clone)]
pub struct Calibrator {
    table: Arc<CalibrationTable>,
}

impl Calibrator {
    /// Calibrator over `table`
    pub fn new(table: CalibrationTable) -> Self {
        Self { table: Arc::new(table) }
    }

    /// Calibrator sharing an existing table
    pub fn shared(table: Arc<CalibrationTable>) -> Self {
        Self { table }
    }

    /// The table in use
    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// Liters for one raw reading
    #[inline]
    pub fn calibrate(&self, raw: u16) -> f64 {
        self.table.lookup(raw)
    }

    /// Calibrate a timestamped sample
    #[inline]
    pub fn calibrate_sample(&self, sample: RawSample) -> CalibratedSample {
        CalibratedSample::new(sample.timestamp, self.calibrate(sample.raw_value))
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationTable::reference())
    }
}
