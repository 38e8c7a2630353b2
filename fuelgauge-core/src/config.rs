//! Engine configuration
//!
//! Every tunable of the engine in one plain value. Defaults reproduce the
//! reference deployment (70 L tank table, +03:30 reference zone, one-hour
//! decay, two decimals). With the `serde` feature the config reads from
//! camelCase JSON; missing fields fall back to their defaults.
//!
//! ```rust
//! use fuelgauge_core::EngineConfig;
//!
//! let config = EngineConfig::default()
//!     .with_decay_tau_secs(1800.0)
//!     .with_round_decimals(1);
//! config.validate().unwrap();
//!
//! let smoother = config.smoother().unwrap();
//! assert_eq!(smoother.decimals(), 1);
//! ```

use crate::calibration::{
    CalibrationBreakpoint, CalibrationTable, Calibrator, REFERENCE_BREAKPOINTS,
    REFERENCE_TABLE_NAME, REFERENCE_TABLE_VERSION,
};
use crate::errors::ConfigResult;
use crate::smoothing::{ExponentialSmoother, DEFAULT_DECAY_TAU_SECS, DEFAULT_ROUND_DECIMALS};
use crate::time::{ReferenceZone, DEFAULT_REFERENCE_OFFSET_SECS};

/// Calibration table as it appears in configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalibrationTableSpec {
    /// Table name, e.g. the tank model
    pub name: String,
    /// Revision of the table for this name
    pub version: u32,
    /// Breakpoints in either raw order
    pub breakpoints: Vec<CalibrationBreakpoint>,
}

impl CalibrationTableSpec {
    /// Validate and build the table
    pub fn build(&self) -> ConfigResult<CalibrationTable> {
        Ok(CalibrationTable::new(
            self.name.clone(),
            self.version,
            &self.breakpoints,
        )?)
    }
}

impl Default for CalibrationTableSpec {
    fn default() -> Self {
        Self {
            name: REFERENCE_TABLE_NAME.to_string(),
            version: REFERENCE_TABLE_VERSION,
            breakpoints: REFERENCE_BREAKPOINTS.to_vec(),
        }
    }
}

impl From<&CalibrationTable> for CalibrationTableSpec {
    fn from(table: &CalibrationTable) -> Self {
        Self {
            name: table.name().to_string(),
            version: table.version(),
            breakpoints: table.breakpoints().to_vec(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct EngineConfig {
    /// Reference zone as seconds east of UTC
    pub reference_offset_secs: i32,
    /// Smoothing decay constant in seconds
    pub decay_tau_secs: f64,
    /// Decimals kept in smoothed output
    pub round_decimals: u32,
    /// Raw-to-liters table
    pub calibration: CalibrationTableSpec,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_offset_secs: DEFAULT_REFERENCE_OFFSET_SECS,
            decay_tau_secs: DEFAULT_DECAY_TAU_SECS,
            round_decimals: DEFAULT_ROUND_DECIMALS,
            calibration: CalibrationTableSpec::default(),
        }
    }
}

impl EngineConfig {
    /// Set the reference zone offset
    pub fn with_reference_offset_secs(mut self, offset_secs: i32) -> Self {
        self.reference_offset_secs = offset_secs;
        self
    }

    /// Set the decay constant
    pub fn with_decay_tau_secs(mut self, tau_secs: f64) -> Self {
        self.decay_tau_secs = tau_secs;
        self
    }

    /// Set output precision
    pub fn with_round_decimals(mut self, decimals: u32) -> Self {
        self.round_decimals = decimals;
        self
    }

    /// Replace the calibration table
    pub fn with_calibration(mut self, calibration: impl Into<CalibrationTableSpec>) -> Self {
        self.calibration = calibration.into();
        self
    }

    /// Check every field without building anything
    pub fn validate(&self) -> ConfigResult<()> {
        self.zone()?;
        self.smoother()?;
        self.calibration.build()?;
        Ok(())
    }

    /// Reference zone
    pub fn zone(&self) -> ConfigResult<ReferenceZone> {
        ReferenceZone::from_offset_secs(self.reference_offset_secs)
    }

    /// Smoother with the configured decay and precision
    pub fn smoother(&self) -> ConfigResult<ExponentialSmoother> {
        ExponentialSmoother::new(self.decay_tau_secs, self.round_decimals)
    }

    /// Calibrator over the configured table
    pub fn calibrator(&self) -> ConfigResult<Calibrator> {
        self.calibration.build().map(Calibrator::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CalibrationError, ConfigError};

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();

        assert_eq!(config.zone().unwrap(), ReferenceZone::default());
        assert_eq!(config.smoother().unwrap(), ExponentialSmoother::default());
        assert_eq!(config.calibrator().unwrap().table(), &CalibrationTable::reference());
    }

    #[test]
    fn rejects_bad_fields() {
        let bad_tau = EngineConfig::default().with_decay_tau_secs(0.0);
        assert_eq!(bad_tau.validate(), Err(ConfigError::InvalidDecay { tau_secs: 0.0 }));

        let bad_offset = EngineConfig::default().with_reference_offset_secs(90_000);
        assert_eq!(
            bad_offset.validate(),
            Err(ConfigError::InvalidOffset { offset_secs: 90_000 })
        );

        let bad_table = EngineConfig::default().with_calibration(CalibrationTableSpec {
            name: "flat".into(),
            version: 1,
            breakpoints: vec![CalibrationBreakpoint::new(10, 1.0)],
        });
        assert_eq!(
            bad_table.validate(),
            Err(ConfigError::Calibration(CalibrationError::TooFewBreakpoints {
                required: 2,
                available: 1,
            }))
        );
    }

    #[test]
    fn table_converts_back_and_forth() {
        let table = CalibrationTable::reference();
        let spec = CalibrationTableSpec::from(&table);
        assert_eq!(spec.build().unwrap(), table);
    }
}
