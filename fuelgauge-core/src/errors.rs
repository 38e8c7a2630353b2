//! Error Types for the Fuel Level Engine
//!
//! ## Design Philosophy
//!
//! Errors here follow two rules:
//!
//! 1. **Small and `Copy`**: every variant carries only numbers and
//!    `&'static str` reasons, so errors can be returned from hot paths and
//!    stored in statistics without allocation.
//!
//! 2. **"No data" is not an error**: a query against a day without samples
//!    returns `Ok(None)`. Only infrastructure failures (`StoreError`) travel
//!    through the `Err` side, so callers can tell an empty tank, an empty day
//!    and an unreachable store apart.
//!
//! ## Error Categories
//!
//! ### Configuration (detected at construction time)
//! - `CalibrationError`: defective breakpoint table (e.g. two breakpoints with
//!   the same raw threshold, which would divide by zero during interpolation)
//! - `ConfigError`: invalid smoothing or time-zone parameters
//!
//! ### Input
//! - `TimeError`: a timestamp string that does not parse in the reference zone
//!
//! ### Infrastructure
//! - `StoreError`: the sample store could not serve a read or accept an append
//! - `QueryError`: either of the above, for queries given as text
//! - `IngestError`: a reading that cannot be placed in a day, or a failed append
//!
//! ```rust
//! use fuelgauge_core::{CalibrationBreakpoint, CalibrationError, CalibrationTable};
//!
//! let result = CalibrationTable::new("broken", 1, &[
//!     CalibrationBreakpoint::new(100, 10.0),
//!     CalibrationBreakpoint::new(100, 20.0),
//! ]);
//! assert_eq!(result.unwrap_err(), CalibrationError::DuplicateThreshold { raw: 100 });
//! ```

use thiserror_no_std::Error;

/// Result type for calibration table construction
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for timestamp parsing
pub type TimeResult<T> = Result<T, TimeError>;

/// Result type for queries given as text
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for ingesting a single reading
pub type IngestResult<T> = Result<T, IngestError>;

/// Calibration table defects, rejected before any sample is calibrated
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// Piecewise interpolation needs at least two points
    #[error("Calibration table needs at least {required} breakpoints, got {available}")]
    TooFewBreakpoints {
        /// Minimum number of breakpoints
        required: usize,
        /// Breakpoints supplied
        available: usize,
    },

    /// Two breakpoints share a raw threshold (zero-width segment)
    #[error("Duplicate raw threshold {raw} in calibration table")]
    DuplicateThreshold {
        /// The repeated threshold
        raw: u16,
    },

    /// Raw thresholds change direction part-way through the table
    #[error("Raw thresholds are not strictly monotonic at breakpoint {index}")]
    NotMonotonic {
        /// Index of the first offending breakpoint, in input order
        index: usize,
    },

    /// A liters value is NaN or infinite
    #[error("Breakpoint {index} has a non-finite liters value")]
    NonFiniteLiters {
        /// Index of the offending breakpoint, in input order
        index: usize,
    },
}

/// Failures of the sample store backend
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum StoreError {
    /// Backend could not be reached or its state is unusable
    #[error("Sample store unavailable: {reason}")]
    Unavailable {
        /// What failed
        reason: &'static str,
    },

    /// Backend refused the write; callers may retry
    #[error("Sample store rejected append: {reason}")]
    AppendRejected {
        /// Why the write was refused
        reason: &'static str,
    },
}

/// Invalid engine configuration
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Decay constant must be finite and strictly positive
    #[error("Invalid decay constant {tau_secs}s")]
    InvalidDecay {
        /// Offending decay constant in seconds
        tau_secs: f64,
    },

    /// Reference offset outside +/- 24h
    #[error("Invalid reference offset {offset_secs}s")]
    InvalidOffset {
        /// Offending offset in seconds east of UTC
        offset_secs: i32,
    },

    /// Too many decimals requested for rounding
    #[error("Rounding to {decimals} decimals is not supported (max {max})")]
    InvalidRounding {
        /// Requested decimals
        decimals: u32,
        /// Largest supported value
        max: u32,
    },

    /// Calibration table inside the configuration is defective
    #[error("Calibration table rejected: {0}")]
    Calibration(CalibrationError),
}

impl From<CalibrationError> for ConfigError {
    fn from(err: CalibrationError) -> Self {
        Self::Calibration(err)
    }
}

/// Timestamp parsing failures
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TimeError {
    /// String does not match any accepted layout
    #[error("Unparseable timestamp: {reason}")]
    Unparseable {
        /// Expected layout
        reason: &'static str,
    },

    /// Instant cannot be represented
    #[error("Timestamp {millis}ms is out of range")]
    OutOfRange {
        /// Offending instant
        millis: i64,
    },
}

/// Failures of a textual point query
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QueryError {
    /// Target timestamp could not be parsed
    #[error("Invalid query target: {0}")]
    InvalidTarget(TimeError),

    /// Store failed while serving the query
    #[error("{0}")]
    Store(StoreError),
}

impl From<TimeError> for QueryError {
    fn from(err: TimeError) -> Self {
        Self::InvalidTarget(err)
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Failures of ingesting one raw reading
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum IngestError {
    /// Reading carries an instant with no calendar day
    #[error("Reading rejected: {0}")]
    InvalidTimestamp(TimeError),

    /// Store refused or failed the append
    #[error("{0}")]
    Store(StoreError),
}

impl From<TimeError> for IngestError {
    fn from(err: TimeError) -> Self {
        Self::InvalidTimestamp(err)
    }
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let err = StoreError::Unavailable { reason: "lock poisoned" };
        assert_eq!(err.to_string(), "Sample store unavailable: lock poisoned");

        let err = CalibrationError::DuplicateThreshold { raw: 4464 };
        assert_eq!(err.to_string(), "Duplicate raw threshold 4464 in calibration table");
    }

    #[test]
    fn calibration_errors_lift_into_config_errors() {
        let err: ConfigError = CalibrationError::NotMonotonic { index: 2 }.into();
        assert_eq!(err, ConfigError::Calibration(CalibrationError::NotMonotonic { index: 2 }));
    }
}
