//! Calibration Table Registry
//!
//! Calibration tables are versioned artifacts: a tank model gets a new
//! version when it is re-measured, and old versions stay available so data
//! calibrated with them can still be explained. The registry tracks every
//! version of every table and resolves "latest" by version number.
//!
//! Tables shipped with the crate live in `calibrations/<name>_v<version>.json`
//! and are embedded at compile time. The file name must match the `name`
//! and `version` inside the file.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use include_dir::{include_dir, Dir};

use fuelgauge_core::{CalibrationTable, CalibrationTableSpec};

use crate::SchemaError;

static EMBEDDED_CALIBRATIONS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/calibrations");

fn poisoned() -> SchemaError {
    SchemaError::ParseError("Lock poisoned".to_string())
}

/// Registry key for one table version
pub fn qualified_name(name: &str, version: u32) -> String {
    format!("{}_v{}", name, version)
}

/// Thread-safe calibration table registry with version management
pub struct CalibrationRegistry {
    /// Tables indexed by qualified name
    tables: RwLock<HashMap<String, Arc<CalibrationTable>>>,

    /// Version mappings (name -> [versions], ascending)
    versions: RwLock<HashMap<String, Vec<u32>>>,
}

impl CalibrationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            versions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a validated table; each name/version pair may be registered once
    pub fn register(&self, table: CalibrationTable) -> Result<Arc<CalibrationTable>, SchemaError> {
        let key = qualified_name(table.name(), table.version());
        let name = table.name().to_string();
        let version = table.version();
        let table = Arc::new(table);

        {
            let mut tables = self.tables.write().map_err(|_| poisoned())?;
            if tables.contains_key(&key) {
                return Err(SchemaError::ValidationError(format!(
                    "Calibration table {} already registered",
                    key
                )));
            }
            tables.insert(key, Arc::clone(&table));
        }

        {
            let mut versions = self.versions.write().map_err(|_| poisoned())?;
            let known = versions.entry(name).or_default();
            let at = known.partition_point(|v| *v < version);
            known.insert(at, version);
        }

        Ok(table)
    }

    /// Parse, validate and register a JSON table artifact
    pub fn register_json(&self, json: &str) -> Result<Arc<CalibrationTable>, SchemaError> {
        let spec: CalibrationTableSpec =
            serde_json::from_str(json).map_err(|e| SchemaError::ParseError(e.to_string()))?;
        let table = spec.build()?;
        self.register(table)
    }

    /// One specific version
    pub fn get(&self, name: &str, version: u32) -> Result<Arc<CalibrationTable>, SchemaError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let key = qualified_name(name, version);
        tables.get(&key).cloned().ok_or(SchemaError::NotFound(key))
    }

    /// Highest registered version of `name`
    pub fn get_latest(&self, name: &str) -> Result<Arc<CalibrationTable>, SchemaError> {
        let latest = self
            .get_versions(name)?
            .last()
            .copied()
            .ok_or_else(|| SchemaError::NotFound(format!("No versions of {}", name)))?;
        self.get(name, latest)
    }

    /// All versions of `name`, ascending
    pub fn get_versions(&self, name: &str) -> Result<Vec<u32>, SchemaError> {
        let versions = self.versions.read().map_err(|_| poisoned())?;
        Ok(versions.get(name).cloned().unwrap_or_default())
    }

    /// Names with at least one registered version, sorted
    pub fn names(&self) -> Result<Vec<String>, SchemaError> {
        let versions = self.versions.read().map_err(|_| poisoned())?;
        let mut names: Vec<String> = versions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Load every table embedded under `calibrations/`
    pub fn load_defaults(&self) -> Result<usize, SchemaError> {
        let mut loaded = 0;
        for file in EMBEDDED_CALIBRATIONS.files() {
            let path = file.path().display().to_string();
            let json = file
                .contents_utf8()
                .ok_or_else(|| SchemaError::ParseError(format!("{} is not UTF-8", path)))?;

            let table = self.register_json(json)?;
            let expected = format!("{}.json", qualified_name(table.name(), table.version()));
            if path != expected {
                return Err(SchemaError::ValidationError(format!(
                    "{} declares {}",
                    path, expected
                )));
            }
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl Default for CalibrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    /// Global registry with the embedded tables loaded
    pub static ref GLOBAL_REGISTRY: CalibrationRegistry = {
        let registry = CalibrationRegistry::new();
        // Embedded tables are covered by tests; a defect leaves the registry empty
        let _ = registry.load_defaults();
        registry
    };
}
