//! Fuel level engine
//!
//! Converts raw analog tank readings into liters, stores them per calendar
//! day of a fixed reference zone, and answers "what was the fuel level at or
//! after time T?" with an exponentially time-decayed average.
//!
//! ```text
//! RawSample ─► Calibrator ─► SampleStore (day partitions) ─► QueryEngine
//!                                                              │
//!                                         ExponentialSmoother ◄┘
//! ```
//!
//! Key properties:
//! - Calibration is total over `u16` and saturates outside the table
//! - Appends never block queries on other days
//! - Results are bit-identical for an unchanged partition
//!
//! ```rust
//! use std::sync::Arc;
//! use fuelgauge_core::{EngineConfig, FuelGauge, MemoryStore, RawSample};
//!
//! let gauge = FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))?;
//! let zone = gauge.zone();
//!
//! for (local, raw) in [("2024-03-10 09:00:00", 5836), ("2024-03-10 10:00:00", 4464)] {
//!     gauge.ingest(RawSample::new(zone.parse_query(local)?, raw))?;
//! }
//!
//! let level = gauge.query_local("2024-03-10 09:30:00")?.unwrap();
//! assert_eq!(level.fuel_level, 14.62);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod calibration;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ingest;
pub mod query;
pub mod queue;
pub mod samples;
pub mod smoothing;
pub mod store;
pub mod stream;
pub mod time;
pub mod traits;

// Public API
pub use calibration::{CalibrationBreakpoint, CalibrationTable, Calibrator};
pub use config::{CalibrationTableSpec, EngineConfig};
pub use engine::FuelGauge;
pub use errors::{
    CalibrationError, ConfigError, IngestError, QueryError, StoreError, TimeError,
};
pub use ingest::{IngestInterrupted, IngestReport, Ingestor, PumpError};
pub use query::QueryEngine;
pub use queue::IngestQueue;
pub use samples::{CalibratedSample, RawSample, SmoothedSample};
pub use smoothing::ExponentialSmoother;
pub use store::MemoryStore;
pub use time::{PartitionKey, ReferenceZone, Timestamp};
pub use traits::{SampleStore, Stream};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
