//! Engine facade
//!
//! [`FuelGauge`] wires one store to an [`Ingestor`] and a [`QueryEngine`]
//! built from the same [`EngineConfig`], so the write and read paths always
//! agree on the reference zone.
//!
//! ```rust
//! use std::sync::Arc;
//! use fuelgauge_core::{EngineConfig, FuelGauge, MemoryStore, RawSample};
//!
//! let gauge = FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))?;
//!
//! let zone = gauge.zone();
//! gauge.ingest(RawSample::new(zone.parse_query("2024-03-10 09:00:00")?, 4464))?;
//!
//! let level = gauge.query_local("2024-03-10 08:00:00")?;
//! assert_eq!(level.map(|s| s.fuel_level), Some(20.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::errors::{ConfigResult, IngestResult, QueryResult, StoreResult};
use crate::ingest::Ingestor;
use crate::query::QueryEngine;
use crate::samples::{CalibratedSample, RawSample, SmoothedSample};
use crate::time::{ReferenceZone, Timestamp};
use crate::traits::SampleStore;

/// Ingestion and queries over one shared store
#[derive(Debug)]
pub struct FuelGauge<S> {
    ingestor: Ingestor<S>,
    queries: QueryEngine<S>,
}

impl<S> Clone for FuelGauge<S> {
    fn clone(&self) -> Self {
        Self {
            ingestor: self.ingestor.clone(),
            queries: self.queries.clone(),
        }
    }
}

impl<S: SampleStore> FuelGauge<S> {
    /// Validate `config` and build both paths over `store`
    pub fn from_config(config: &EngineConfig, store: Arc<S>) -> ConfigResult<Self> {
        let zone = config.zone()?;
        let smoother = config.smoother()?;
        let calibrator = config.calibrator()?;

        log_debug!(
            "Engine ready: table {} v{}, tau {}s, offset {}s",
            calibrator.table().name(),
            calibrator.table().version(),
            smoother.tau_secs(),
            zone.offset_secs()
        );

        Ok(Self {
            ingestor: Ingestor::new(calibrator, Arc::clone(&store), zone),
            queries: QueryEngine::new(store, smoother, zone),
        })
    }

    /// Write path
    pub fn ingestor(&self) -> &Ingestor<S> {
        &self.ingestor
    }

    /// Read path
    pub fn queries(&self) -> &QueryEngine<S> {
        &self.queries
    }

    /// Reference zone shared by both paths
    pub fn zone(&self) -> ReferenceZone {
        self.queries.zone()
    }

    /// See [`Ingestor::ingest`]
    pub fn ingest(&self, raw: RawSample) -> IngestResult<CalibratedSample> {
        self.ingestor.ingest(raw)
    }

    /// See [`QueryEngine::query_at`]
    pub fn query_at(&self, target: Timestamp) -> StoreResult<Option<SmoothedSample>> {
        self.queries.query_at(target)
    }

    /// See [`QueryEngine::query_local`]
    pub fn query_local(&self, target: &str) -> QueryResult<Option<SmoothedSample>> {
        self.queries.query_local(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;
    use crate::store::MemoryStore;

    #[test]
    fn paths_share_one_store() {
        let gauge = FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))
            .unwrap();
        assert!(Arc::ptr_eq(gauge.ingestor().store(), gauge.queries().store()));
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = EngineConfig::default().with_round_decimals(20);
        let err = FuelGauge::from_config(&config, Arc::new(MemoryStore::new())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRounding { decimals: 20, .. }));
    }

    #[test]
    fn custom_offset_moves_day_boundary() {
        let config = EngineConfig::default().with_reference_offset_secs(0);
        let gauge = FuelGauge::from_config(&config, Arc::new(MemoryStore::new())).unwrap();

        // 23:30 UTC belongs to the UTC day, not the +03:30 one
        let ts = gauge.zone().parse_query("2024-03-10 23:30:00").unwrap();
        gauge.ingest(RawSample::new(ts, 477)).unwrap();

        let hit = gauge.query_local("2024-03-10 23:00:00").unwrap();
        assert_eq!(hit.map(|s| s.fuel_level), Some(70.0));
    }
}
