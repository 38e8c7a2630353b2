//! Avro schema definitions
//!
//! Field names match the JSON ingestion record so both encodings describe
//! the same thing. Schemas follow semantic versioning; a new field gets a
//! default and a new `_vN` function.

use apache_avro::Schema;
use serde_json::json;

use crate::SchemaError;

/// Namespace of the ingestion record
pub const SENSOR_NAMESPACE: &str = "io.fuelgauge.sensors.v1";

/// Raw tank reading as forwarded by a gateway, v1.0.0
pub fn fuel_sensor_event_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": SENSOR_NAMESPACE,
        "type": "record",
        "name": "FuelSensorEvent",
        "doc": "Uncalibrated analog fuel sender reading",
        "fields": [
            {
                "name": "ServerDateTime",
                "type": "string",
                "doc": "Local time in the reference zone, YYYY-MM-DD HH:MM:SS.fff"
            },
            {
                "name": "AnalogIN1",
                "type": "int",
                "doc": "Raw sender value, 0..=65535; higher means less fuel"
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}

/// Point query answer, v1.0.0
pub fn fuel_level_response_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.fuelgauge.queries.v1",
        "type": "record",
        "name": "FuelLevelResponse",
        "doc": "Smoothed fuel level at or after the requested instant",
        "fields": [
            {
                "name": "fuelLevel",
                "type": "double",
                "doc": "Liters; 0 when no data is available"
            },
            {
                "name": "message",
                "type": ["null", "string"],
                "default": null
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}
