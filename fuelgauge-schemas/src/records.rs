//! Wire records
//!
//! ## Ingestion
//!
//! Gateways publish one JSON object per reading:
//!
//! ```json
//! { "ServerDateTime": "2024-03-10 09:00:00.000", "AnalogIN1": 5836 }
//! ```
//!
//! The timestamp is local wall-clock time in the reference zone. Anything
//! that does not decode into a [`RawSample`] (bad JSON, unparseable time, a
//! raw value outside `u16`) is a [`SchemaError::InvalidRecord`]; the
//! transport drops such records and keeps going.
//!
//! Binary transports carry the same record as an Avro datum
//! ([`FuelSensorEvent::to_avro`]).
//!
//! ## Query answer
//!
//! ```json
//! { "fuelLevel": 31.5, "message": null }
//! { "fuelLevel": 0.0, "message": "No Valid Data Available" }
//! ```
//!
//! Binary clients get the same answer as an Avro datum
//! ([`FuelLevelResponse::to_avro`]).

use apache_avro::types::Value;
use apache_avro::{from_avro_datum, to_avro_datum, Schema};
use serde::{Deserialize, Serialize};

use fuelgauge_core::{RawSample, ReferenceZone, SmoothedSample};

use crate::SchemaError;

/// Message sent when a query has no answer
pub const NO_DATA_MESSAGE: &str = "No Valid Data Available";

const TIME_FIELD: &str = "ServerDateTime";
const RAW_FIELD: &str = "AnalogIN1";
const LEVEL_FIELD: &str = "fuelLevel";
const MESSAGE_FIELD: &str = "message";

/// Ingestion record as published by a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelSensorEvent {
    /// Local time, `YYYY-MM-DD HH:MM:SS.fff`
    #[serde(rename = "ServerDateTime")]
    pub server_date_time: String,
    /// Raw sender value; wider than `u16` so range errors are reported, not
    /// swallowed by the decoder
    #[serde(rename = "AnalogIN1")]
    pub analog_in1: i64,
}

impl FuelSensorEvent {
    /// Record for `sample`, rendered in `zone`
    pub fn from_raw_sample(sample: RawSample, zone: &ReferenceZone) -> Result<Self, SchemaError> {
        Ok(Self {
            server_date_time: zone.format(sample.timestamp)?,
            analog_in1: i64::from(sample.raw_value),
        })
    }

    /// Decode into a reading, interpreting the time in `zone`
    pub fn to_raw_sample(&self, zone: &ReferenceZone) -> Result<RawSample, SchemaError> {
        let timestamp = zone.parse_ingest(&self.server_date_time)?;
        let raw_value = u16::try_from(self.analog_in1).map_err(|_| {
            SchemaError::InvalidRecord(format!("{} out of range: {}", RAW_FIELD, self.analog_in1))
        })?;
        Ok(RawSample::new(timestamp, raw_value))
    }

    /// Parse a JSON payload
    pub fn from_json(payload: &[u8]) -> Result<Self, SchemaError> {
        serde_json::from_slice(payload).map_err(|e| SchemaError::InvalidRecord(e.to_string()))
    }

    /// Render as JSON
    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self).map_err(|e| SchemaError::Encoding(e.to_string()))
    }

    /// Encode as a bare Avro datum against `schema`
    pub fn to_avro(&self, schema: &Schema) -> Result<Vec<u8>, SchemaError> {
        let raw = i32::try_from(self.analog_in1).map_err(|_| {
            SchemaError::InvalidRecord(format!("{} out of range: {}", RAW_FIELD, self.analog_in1))
        })?;
        let value = Value::Record(vec![
            (TIME_FIELD.to_string(), Value::String(self.server_date_time.clone())),
            (RAW_FIELD.to_string(), Value::Int(raw)),
        ]);

        to_avro_datum(schema, value).map_err(|e| SchemaError::Encoding(e.to_string()))
    }

    /// Decode a bare Avro datum written with `schema`
    pub fn from_avro(schema: &Schema, mut datum: &[u8]) -> Result<Self, SchemaError> {
        let value = from_avro_datum(schema, &mut datum, None)
            .map_err(|e| SchemaError::InvalidRecord(e.to_string()))?;

        let Value::Record(fields) = value else {
            return Err(SchemaError::InvalidRecord("expected a record".to_string()));
        };

        let mut server_date_time = None;
        let mut analog_in1 = None;
        for (name, field) in fields {
            match (name.as_str(), field) {
                (TIME_FIELD, Value::String(text)) => server_date_time = Some(text),
                (RAW_FIELD, Value::Int(raw)) => analog_in1 = Some(i64::from(raw)),
                _ => {}
            }
        }

        match (server_date_time, analog_in1) {
            (Some(server_date_time), Some(analog_in1)) => Ok(Self { server_date_time, analog_in1 }),
            _ => Err(SchemaError::InvalidRecord(format!(
                "missing {} or {}",
                TIME_FIELD, RAW_FIELD
            ))),
        }
    }
}

/// Decode a JSON ingestion payload straight into a reading
pub fn parse_ingest_json(payload: &[u8], zone: &ReferenceZone) -> Result<RawSample, SchemaError> {
    FuelSensorEvent::from_json(payload)?.to_raw_sample(zone)
}

/// Answer to a point query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelLevelResponse {
    /// Smoothed liters, `0` when there is no data
    pub fuel_level: f64,
    /// Set only when there is no data
    pub message: Option<String>,
}

impl FuelLevelResponse {
    /// A found level
    pub fn found(fuel_level: f64) -> Self {
        Self { fuel_level, message: None }
    }

    /// No sample at or after the target on its day
    pub fn no_data() -> Self {
        Self {
            fuel_level: 0.0,
            message: Some(NO_DATA_MESSAGE.to_string()),
        }
    }

    /// True when this answer carries a level
    pub fn has_data(&self) -> bool {
        self.message.is_none()
    }

    /// Render as JSON
    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self).map_err(|e| SchemaError::Encoding(e.to_string()))
    }

    /// Encode as a bare Avro datum against `schema`
    pub fn to_avro(&self, schema: &Schema) -> Result<Vec<u8>, SchemaError> {
        let message = match &self.message {
            Some(text) => Value::Union(1, Box::new(Value::String(text.clone()))),
            None => Value::Union(0, Box::new(Value::Null)),
        };
        let value = Value::Record(vec![
            (LEVEL_FIELD.to_string(), Value::Double(self.fuel_level)),
            (MESSAGE_FIELD.to_string(), message),
        ]);

        to_avro_datum(schema, value).map_err(|e| SchemaError::Encoding(e.to_string()))
    }

    /// Decode a bare Avro datum written with `schema`
    pub fn from_avro(schema: &Schema, mut datum: &[u8]) -> Result<Self, SchemaError> {
        let value = from_avro_datum(schema, &mut datum, None)
            .map_err(|e| SchemaError::InvalidRecord(e.to_string()))?;

        let Value::Record(fields) = value else {
            return Err(SchemaError::InvalidRecord("expected a record".to_string()));
        };

        let mut fuel_level = None;
        let mut message = None;
        for (name, field) in fields {
            match (name.as_str(), field) {
                (LEVEL_FIELD, Value::Double(level)) => fuel_level = Some(level),
                (MESSAGE_FIELD, Value::Union(_, inner)) => {
                    if let Value::String(text) = *inner {
                        message = Some(text);
                    }
                }
                _ => {}
            }
        }

        let fuel_level = fuel_level
            .ok_or_else(|| SchemaError::InvalidRecord(format!("missing {}", LEVEL_FIELD)))?;
        Ok(Self { fuel_level, message })
    }
}

impl From<Option<SmoothedSample>> for FuelLevelResponse {
    fn from(result: Option<SmoothedSample>) -> Self {
        match result {
            Some(sample) => Self::found(sample.fuel_level),
            None => Self::no_data(),
        }
    }
}
