//! Engine configuration from JSON
//!
//! ```json
//! {
//!   "referenceOffsetSecs": 12600,
//!   "decayTauSecs": 3600.0,
//!   "roundDecimals": 2,
//!   "calibration": { "name": "tank_70l", "version": 1, "breakpoints": [...] }
//! }
//! ```
//!
//! Every field is optional. Instead of inline breakpoints, `calibrationRef`
//! may name a registered table; `"version"` is optional there and defaults
//! to the latest.

use serde::Deserialize;

use fuelgauge_core::{CalibrationTableSpec, EngineConfig};

use crate::registry::{CalibrationRegistry, GLOBAL_REGISTRY};
use crate::SchemaError;

/// Reference to a registered calibration table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalibrationRef {
    /// Table name
    pub name: String,
    /// Exact version, or the latest when absent
    pub version: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument {
    #[serde(flatten)]
    engine: EngineConfig,
    calibration_ref: Option<CalibrationRef>,
}

/// Parse and validate an engine configuration, resolving table references
/// against the global registry
pub fn config_from_json(json: &str) -> Result<EngineConfig, SchemaError> {
    config_from_json_with(json, &GLOBAL_REGISTRY)
}

/// [`config_from_json`] against a specific registry
pub fn config_from_json_with(
    json: &str,
    registry: &CalibrationRegistry,
) -> Result<EngineConfig, SchemaError> {
    let document: ConfigDocument =
        serde_json::from_str(json).map_err(|e| SchemaError::ParseError(e.to_string()))?;
    let mut config = document.engine;

    if let Some(reference) = document.calibration_ref {
        let table = match reference.version {
            Some(version) => registry.get(&reference.name, version)?,
            None => registry.get_latest(&reference.name)?,
        };
        config.calibration = CalibrationTableSpec::from(table.as_ref());
    }

    config.validate()?;
    Ok(config)
}
