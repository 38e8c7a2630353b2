//! Point-in-Time Fuel Level Queries
//!
//! A query answers "what was the fuel level at or after instant T?":
//!
//! 1. Find the day partition holding `T` in the reference zone.
//! 2. Snapshot that partition from the store.
//! 3. Smooth it from the first sample of the day. The decayed average
//!    depends on the whole preceding history, so the pass can never start
//!    at `T`.
//! 4. Return the first smoothed sample with `timestamp >= T`. Not the
//!    nearest one, and never one before `T`.
//!
//! ```text
//! day:      09:00    10:00           11:00
//!             ●────────●───────────────●
//! query 10:30                  ▲
//!                              └──────► answer is the 11:00 entry
//! ```
//!
//! No sample at or after `T` on that day (including an empty day) is
//! `Ok(None)`. It is not extrapolated and not looked up on the next day.
//! Store failures come back as `Err`.
//!
//! Because the recurrence only looks backwards, the pass stops at the first
//! match. Samples later in the day cannot change the answer, and samples
//! appended after the snapshot are not seen by an in-flight query.

use std::sync::Arc;

use crate::errors::{QueryResult, StoreResult};
use crate::samples::SmoothedSample;
use crate::smoothing::ExponentialSmoother;
use crate::time::{PartitionKey, ReferenceZone, Timestamp};
use crate::traits::SampleStore;

/// Answers point queries against a sample store
#[derive(Debug)]
pub struct QueryEngine<S> {
    store: Arc<S>,
    smoother: ExponentialSmoother,
    zone: ReferenceZone,
}

impl<S> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            smoother: self.smoother,
            zone: self.zone,
        }
    }
}

impl<S: SampleStore> QueryEngine<S> {
    /// Engine over `store`, partitioning by `zone`
    pub fn new(store: Arc<S>, smoother: ExponentialSmoother, zone: ReferenceZone) -> Self {
        Self { store, smoother, zone }
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reference zone of the partitions
    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Smoother applied to each partition
    pub fn smoother(&self) -> ExponentialSmoother {
        self.smoother
    }

    /// First smoothed sample at or after `target` on `target`'s day
    pub fn query_at(&self, target: Timestamp) -> StoreResult<Option<SmoothedSample>> {
        let day = match self.zone.partition_of(target) {
            Ok(day) => day,
            Err(_) => {
                log_debug!("Query target {}ms has no calendar day", target);
                return Ok(None);
            }
        };

        let samples = self.store.scan_partition(day)?;
        let hit = self
            .smoother
            .smooth_iter(&samples)
            .find(|smoothed| smoothed.timestamp >= target);

        if hit.is_none() {
            log_debug!(
                "No data at or after {}ms in partition {} ({} samples)",
                target,
                day,
                samples.len()
            );
        }

        Ok(hit)
    }

    /// [`query_at`](Self::query_at) for a local `YYYY-MM-DD HH:MM:SS` string
    pub fn query_local(&self, target: &str) -> QueryResult<Option<SmoothedSample>> {
        let target = self.zone.parse_query(target)?;
        Ok(self.query_at(target)?)
    }

    /// Smoothed values for every sample of `day`
    pub fn smoothed_partition(&self, day: PartitionKey) -> StoreResult<Vec<SmoothedSample>> {
        let samples = self.store.scan_partition(day)?;
        Ok(self.smoother.smooth_partition(&samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{QueryError, StoreError};
    use crate::samples::CalibratedSample;
    use crate::store::MemoryStore;

    fn engine() -> QueryEngine<MemoryStore> {
        QueryEngine::new(
            Arc::new(MemoryStore::new()),
            ExponentialSmoother::default(),
            ReferenceZone::default(),
        )
    }

    fn put(engine: &QueryEngine<MemoryStore>, local: &str, liters: f64) -> Timestamp {
        let zone = engine.zone();
        let ts = zone.parse_query(local).unwrap();
        let day = zone.partition_of(ts).unwrap();
        engine.store().append(day, CalibratedSample::new(ts, liters)).unwrap();
        ts
    }

    #[test]
    fn empty_day_is_not_found() {
        let engine = engine();
        assert_eq!(engine.query_local("2024-03-10 10:00:00").unwrap(), None);
    }

    #[test]
    fn selects_first_at_or_after() {
        let engine = engine();
        let t1 = put(&engine, "2024-03-10 09:00:00", 30.0);
        let t2 = put(&engine, "2024-03-10 10:00:00", 30.0);

        let between = engine.query_local("2024-03-10 09:30:00").unwrap().unwrap();
        assert_eq!(between.timestamp, t2);

        let exact = engine.query_at(t1).unwrap().unwrap();
        assert_eq!(exact.timestamp, t1);

        let early = engine.query_local("2024-03-10 00:00:00").unwrap().unwrap();
        assert_eq!(early.timestamp, t1);
    }

    #[test]
    fn after_last_sample_is_not_found() {
        let engine = engine();
        put(&engine, "2024-03-10 09:00:00", 30.0);
        // Next day has data but is a different partition
        put(&engine, "2024-03-11 01:00:00", 30.0);

        assert_eq!(engine.query_local("2024-03-10 09:00:01").unwrap(), None);
    }

    #[test]
    fn zero_liters_is_a_reading() {
        let engine = engine();
        put(&engine, "2024-03-10 09:00:00", 0.0);

        let hit = engine.query_local("2024-03-10 08:00:00").unwrap();
        assert_eq!(hit.map(|s| s.fuel_level), Some(0.0));
    }

    #[test]
    fn bad_target_is_an_input_error() {
        let engine = engine();
        assert!(matches!(
            engine.query_local("yesterday"),
            Err(QueryError::InvalidTarget(_))
        ));
    }

    struct BrokenStore;

    impl SampleStore for BrokenStore {
        fn append(&self, _: PartitionKey, _: CalibratedSample) -> StoreResult<()> {
            Err(StoreError::Unavailable { reason: "connection refused" })
        }

        fn scan_partition(&self, _: PartitionKey) -> StoreResult<Vec<CalibratedSample>> {
            Err(StoreError::Unavailable { reason: "connection refused" })
        }

        fn partitions(&self) -> StoreResult<Vec<PartitionKey>> {
            Err(StoreError::Unavailable { reason: "connection refused" })
        }
    }

    #[test]
    fn store_failure_is_distinct_from_no_data() {
        let engine = QueryEngine::new(
            Arc::new(BrokenStore),
            ExponentialSmoother::default(),
            ReferenceZone::default(),
        );

        assert_eq!(
            engine.query_local("2024-03-10 10:00:00"),
            Err(QueryError::Store(StoreError::Unavailable { reason: "connection refused" }))
        );
    }
}
