//! Wire Formats and Calibration Artifacts for the Fuel Level Engine
//!
//! ## Overview
//!
//! Everything that crosses a process boundary is defined here:
//!
//! - [`records`]: the gateway ingestion record (JSON and Avro) and the
//!   point query answer
//! - [`schemas`]: Avro schema definitions for those records
//! - [`registry`]: versioned calibration tables, including the ones
//!   embedded in this crate
//! - [`config`]: engine configuration documents
//!
//! ## Why Avro next to JSON?
//!
//! JSON is what gateways publish today and stays the default. Cellular
//! links pay per byte, though, and an Avro datum of the same reading is a
//! fraction of the size with the schema agreed out of band. Field names are
//! identical in both encodings.
//!
//! ## Usage Example
//!
//! ```rust
//! use fuelgauge_core::ReferenceZone;
//! use fuelgauge_schemas::{parse_ingest_json, GLOBAL_REGISTRY};
//!
//! let zone = ReferenceZone::default();
//! let sample = parse_ingest_json(
//!     br#"{"ServerDateTime":"2024-03-10 09:00:00.000","AnalogIN1":2561}"#,
//!     &zone,
//! )?;
//!
//! let table = GLOBAL_REGISTRY.get_latest("tank_70l")?;
//! assert_eq!(table.lookup(sample.raw_value), 40.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use fuelgauge_core::{CalibrationError, ConfigError, TimeError};

pub mod config;
pub mod records;
pub mod registry;
pub mod schemas;

pub use config::{config_from_json, config_from_json_with, CalibrationRef};
pub use records::{parse_ingest_json, FuelLevelResponse, FuelSensorEvent, NO_DATA_MESSAGE};
pub use registry::{CalibrationRegistry, GLOBAL_REGISTRY};

/// Schema-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror_no_std::Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    ParseError(String),

    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<CalibrationError> for SchemaError {
    fn from(err: CalibrationError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ConfigError> for SchemaError {
    fn from(err: ConfigError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<TimeError> for SchemaError {
    fn from(err: TimeError) -> Self {
        Self::InvalidRecord(err.to_string())
    }
}
