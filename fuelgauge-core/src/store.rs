//! In-Memory Ordered Sample Store
//!
//! ## Overview
//!
//! Calibrated samples are grouped into one [`Partition`] per calendar day of
//! the reference zone. A partition is a plain vector kept sorted by
//! timestamp, which is what the smoother needs: one forward pass from the
//! first sample of the day.
//!
//! ## Ordering
//!
//! Sensor gateways deliver in order almost always, so the common append is a
//! push at the tail. Late samples are inserted after every sample with an
//! equal or smaller timestamp:
//!
//! ```text
//! partition:  [t1, t2, t2', t4]
//! append t2'' ─────────────┐
//!                          ▼
//! partition:  [t1, t2, t2', t2'', t4]    (ties keep arrival order)
//! ```
//!
//! Duplicate timestamps are never collapsed; every sample contributes to
//! smoothing.
//!
//! ## Locking
//!
//! ```text
//! RwLock<BTreeMap<day, Arc<RwLock<Partition>>>>
//!   │                       │
//!   │ write-locked only     └─ one writer per partition; readers copy a
//!   │ to create a day          snapshot and release the lock before smoothing
//!   └─ read-locked for every append and scan
//! ```
//!
//! Appends to different days never contend, and a query never holds a lock
//! while it computes. A poisoned lock is reported as
//! [`StoreError::Unavailable`] rather than a panic.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::errors::{StoreError, StoreResult};
use crate::samples::CalibratedSample;
use crate::time::{PartitionKey, Timestamp};
use crate::traits::SampleStore;

const POISONED: StoreError = StoreError::Unavailable { reason: "lock poisoned" };

/// One day of calibrated samples, ascending by timestamp
#[derive(Debug, Clone, Default)]
pub struct Partition {
    samples: Vec<CalibratedSample>,
}

impl Partition {
    /// Creates an empty partition
    pub fn new() -> Self {
        Self { samples: Vec::new() }
    }

    /// Insert keeping timestamp order; equal timestamps keep arrival order
    pub fn append(&mut self, sample: CalibratedSample) {
        match self.samples.last() {
            Some(last) if last.timestamp > sample.timestamp => {
                let at = self.samples.partition_point(|s| s.timestamp <= sample.timestamp);
                self.samples.insert(at, sample);
            }
            _ => self.samples.push(sample),
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if partition is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples in order
    pub fn as_slice(&self) -> &[CalibratedSample] {
        &self.samples
    }

    /// Samples from the first one with `timestamp >= from`
    pub fn range_from(&self, from: Timestamp) -> &[CalibratedSample] {
        let start = self.samples.partition_point(|s| s.timestamp < from);
        &self.samples[start..]
    }

    /// Earliest sample
    pub fn first(&self) -> Option<&CalibratedSample> {
        self.samples.first()
    }

    /// Latest sample
    pub fn last(&self) -> Option<&CalibratedSample> {
        self.samples.last()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> core::slice::Iter<'_, CalibratedSample> {
        self.samples.iter()
    }
}

type SharedPartition = Arc<RwLock<Partition>>;

/// Day-partitioned store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<PartitionKey, SharedPartition>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, day: PartitionKey) -> StoreResult<Option<SharedPartition>> {
        let map = self.partitions.read().map_err(|_| POISONED)?;
        Ok(map.get(&day).cloned())
    }

    fn partition_or_create(&self, day: PartitionKey) -> StoreResult<SharedPartition> {
        if let Some(existing) = self.partition(day)? {
            return Ok(existing);
        }

        let mut map = self.partitions.write().map_err(|_| POISONED)?;
        let entry = map.entry(day).or_insert_with(|| {
            log_debug!("Creating partition {}", day);
            Arc::new(RwLock::new(Partition::new()))
        });
        Ok(Arc::clone(entry))
    }
}

impl SampleStore for MemoryStore {
    fn append(&self, day: PartitionKey, sample: CalibratedSample) -> StoreResult<()> {
        let partition = self.partition_or_create(day)?;
        let mut guard = partition.write().map_err(|_| POISONED)?;
        guard.append(sample);
        Ok(())
    }

    fn scan_partition(&self, day: PartitionKey) -> StoreResult<Vec<CalibratedSample>> {
        match self.partition(day)? {
            Some(partition) => {
                let guard = partition.read().map_err(|_| POISONED)?;
                Ok(guard.as_slice().to_vec())
            }
            None => Ok(Vec::new()),
        }
    }

    fn range_from(&self, day: PartitionKey, from: Timestamp) -> StoreResult<Vec<CalibratedSample>> {
        match self.partition(day)? {
            Some(partition) => {
                let guard = partition.read().map_err(|_| POISONED)?;
                Ok(guard.range_from(from).to_vec())
            }
            None => Ok(Vec::new()),
        }
    }

    fn partitions(&self) -> StoreResult<Vec<PartitionKey>> {
        let map = self.partitions.read().map_err(|_| POISONED)?;
        Ok(map.keys().copied().collect())
    }

    fn len(&self, day: PartitionKey) -> StoreResult<usize> {
        match self.partition(day)? {
            Some(partition) => Ok(partition.read().map_err(|_| POISONED)?.len()),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> PartitionKey {
        PartitionKey::from_ymd(2024, 3, 10).unwrap()
    }

    fn timestamps(samples: &[CalibratedSample]) -> Vec<Timestamp> {
        samples.iter().map(|s| s.timestamp).collect()
    }

    #[test]
    fn empty_partition() {
        let store = MemoryStore::new();
        assert!(store.scan_partition(day()).unwrap().is_empty());
        assert_eq!(store.len(day()).unwrap(), 0);
        assert!(store.partitions().unwrap().is_empty());
    }

    #[test]
    fn in_order_appends() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.append(day(), CalibratedSample::new(i * 1000, i as f64)).unwrap();
        }

        let samples = store.scan_partition(day()).unwrap();
        assert_eq!(timestamps(&samples), vec![0, 1000, 2000, 3000, 4000]);
    }

    #[test]
    fn late_samples_are_ordered() {
        let mut partition = Partition::new();
        partition.append(CalibratedSample::new(3000, 3.0));
        partition.append(CalibratedSample::new(1000, 1.0));
        partition.append(CalibratedSample::new(2000, 2.0));

        assert_eq!(timestamps(partition.as_slice()), vec![1000, 2000, 3000]);
    }

    #[test]
    fn duplicate_timestamps_keep_arrival_order() {
        let mut partition = Partition::new();
        partition.append(CalibratedSample::new(1000, 1.0));
        partition.append(CalibratedSample::new(3000, 3.0));
        partition.append(CalibratedSample::new(1000, 10.0));
        partition.append(CalibratedSample::new(1000, 100.0));

        let liters: Vec<f64> = partition.iter().map(|s| s.liters).collect();
        assert_eq!(liters, vec![1.0, 10.0, 100.0, 3.0]);
    }

    #[test]
    fn range_from_starts_at_first_at_or_after() {
        let store = MemoryStore::new();
        for ts in [1000, 2000, 3000] {
            store.append(day(), CalibratedSample::new(ts, 0.0)).unwrap();
        }

        assert_eq!(timestamps(&store.range_from(day(), 2000).unwrap()), vec![2000, 3000]);
        assert_eq!(timestamps(&store.range_from(day(), 2500).unwrap()), vec![3000]);
        assert!(store.range_from(day(), 3001).unwrap().is_empty());
    }

    #[test]
    fn partitions_are_independent() {
        let store = MemoryStore::new();
        let other = PartitionKey::from_ymd(2024, 3, 11).unwrap();

        store.append(other, CalibratedSample::new(10, 1.0)).unwrap();
        store.append(day(), CalibratedSample::new(5, 2.0)).unwrap();

        assert_eq!(store.partitions().unwrap(), vec![day(), other]);
        assert_eq!(store.len(day()).unwrap(), 1);
        assert_eq!(store.len(other).unwrap(), 1);
    }

    #[test]
    fn scan_is_a_snapshot() {
        let store = MemoryStore::new();
        store.append(day(), CalibratedSample::new(1000, 1.0)).unwrap();

        let snapshot = store.scan_partition(day()).unwrap();
        store.append(day(), CalibratedSample::new(500, 0.5)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(day()).unwrap(), 2);
    }
}
