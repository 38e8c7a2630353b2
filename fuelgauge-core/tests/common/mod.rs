//! Shared fixtures for integration tests
//!
//! - [`TankSimulator`]: deterministic raw readings for a driving day
//! - [`gauge`] / [`feed`]: an engine over a fresh memory store

#![allow(dead_code)]

use std::sync::Arc;

use fuelgauge_core::{
    CalibrationTable, EngineConfig, FuelGauge, MemoryStore, RawSample, ReferenceZone, Timestamp,
};

/// Engine with the reference configuration over an empty store
pub fn gauge() -> FuelGauge<MemoryStore> {
    FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))
        .expect("reference configuration is valid")
}

/// Local `YYYY-MM-DD HH:MM:SS` in the reference zone
pub fn local(text: &str) -> Timestamp {
    ReferenceZone::default().parse_query(text).expect("valid local time")
}

/// Ingest `(local time, raw)` pairs
pub fn feed(gauge: &FuelGauge<MemoryStore>, readings: &[(&str, u16)]) {
    for &(time, raw) in readings {
        gauge.ingest(RawSample::new(local(time), raw)).expect("ingest");
    }
}

/// Raw value whose calibration is exactly `liters` on the reference table,
/// for the breakpoint liters values
pub fn raw_for(liters: f64) -> u16 {
    CalibrationTable::reference()
        .breakpoints()
        .iter()
        .find(|bp| bp.liters_at_threshold == liters)
        .map(|bp| bp.raw_threshold)
        .expect("liters value is a breakpoint")
}

/// Deterministic fuel sender simulation
///
/// Burns fuel at a constant rate while driving, adds sloshing noise and
/// refuels when the tank runs low. Uses a fixed-seed LCG so every run
/// produces the same day.
pub struct TankSimulator {
    seed: u32,
    liters: f64,
}

impl TankSimulator {
    /// Tank starting at `liters`
    pub fn new(liters: f64) -> Self {
        Self { seed: 42, liters }
    }

    /// Readings every `interval_ms` from `start` for `count` samples
    pub fn day(&mut self, start: Timestamp, interval_ms: i64, count: usize) -> Vec<RawSample> {
        let table = CalibrationTable::reference();
        (0..count)
            .map(|i| {
                self.liters -= 0.05;
                if self.liters < 5.0 {
                    self.liters = 65.0;
                }
                let sloshing = (self.random_float() - 0.5) * 4.0;
                let raw = Self::raw_for_liters(&table, (self.liters + sloshing).clamp(0.0, 70.0));
                RawSample::new(start + i as i64 * interval_ms, raw)
            })
            .collect()
    }

    /// Inverse of the reference table, for generating readings
    fn raw_for_liters(table: &CalibrationTable, liters: f64) -> u16 {
        let bps = table.breakpoints();
        for pair in bps.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            // Ascending raw means descending liters
            if liters <= lo.liters_at_threshold && liters >= hi.liters_at_threshold {
                let span = lo.liters_at_threshold - hi.liters_at_threshold;
                let t = (lo.liters_at_threshold - liters) / span;
                let raw = f64::from(lo.raw_threshold)
                    + t * f64::from(hi.raw_threshold - lo.raw_threshold);
                return raw.round() as u16;
            }
        }
        bps[0].raw_threshold
    }

    fn random_float(&mut self) -> f64 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223);
        f64::from(self.seed) / f64::from(u32::MAX)
    }
}
