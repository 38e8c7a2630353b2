//! Sample types flowing through the engine
//!
//! ```text
//! RawSample ──calibrate──► CalibratedSample ──smooth──► SmoothedSample
//! (sensor units)           (liters, stored)             (liters, derived)
//! ```

use crate::time::Timestamp;

/// Uncalibrated analog reading as delivered by the ingestion path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample {
    /// Reading instant
    pub timestamp: Timestamp,
    /// Device units; higher means less fuel
    pub raw_value: u16,
}

impl RawSample {
    /// Reading taken at `timestamp`
    pub const fn new(timestamp: Timestamp, raw_value: u16) -> Self {
        Self { timestamp, raw_value }
    }
}

/// Reading converted to liters. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibratedSample {
    /// Reading instant
    pub timestamp: Timestamp,
    /// Fuel volume
    pub liters: f64,
}

impl CalibratedSample {
    /// Calibrated reading at `timestamp`
    pub const fn new(timestamp: Timestamp, liters: f64) -> Self {
        Self { timestamp, liters }
    }
}

/// Smoothed fuel level at a sample position.
///
/// A view over a partition, recomputed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothedSample {
    /// Instant of the underlying sample
    pub timestamp: Timestamp,
    /// Decayed average in liters, rounded
    pub fuel_level: f64,
}
