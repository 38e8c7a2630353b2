//! Sample Store Trait
//!
//! The engine never talks to a concrete backend. Calibrated samples go in
//! through [`SampleStore::append`] and come back out, per day partition, in
//! timestamp order. The in-process [`MemoryStore`](crate::store::MemoryStore)
//! is the default implementation; a columnar database adapter implements the
//! same trait.
//!
//! ## Contract
//!
//! - Append is the only mutation. Nothing is updated or deleted.
//! - Reads return samples ascending by timestamp; equal timestamps keep
//!   arrival order.
//! - A read returns a snapshot: samples appended after the read started are
//!   not part of its result.
//! - An empty partition is `Ok(vec![])`, never an error. `Err` means the
//!   backend itself failed.

use crate::errors::StoreResult;
use crate::samples::CalibratedSample;
use crate::time::{PartitionKey, Timestamp};

/// Append-only, day-partitioned store of calibrated samples
pub trait SampleStore: Send + Sync {
    /// Add one sample to the partition `day`
    fn append(&self, day: PartitionKey, sample: CalibratedSample) -> StoreResult<()>;

    /// Every sample of `day`, ascending by timestamp
    fn scan_partition(&self, day: PartitionKey) -> StoreResult<Vec<CalibratedSample>>;

    /// Samples of `day` starting at the first one with `timestamp >= from`
    fn range_from(&self, day: PartitionKey, from: Timestamp) -> StoreResult<Vec<CalibratedSample>> {
        let mut samples = self.scan_partition(day)?;
        let start = samples.partition_point(|s| s.timestamp < from);
        samples.drain(..start);
        Ok(samples)
    }

    /// Days that hold at least one sample, ascending
    fn partitions(&self) -> StoreResult<Vec<PartitionKey>>;

    /// Number of samples in `day`
    fn len(&self, day: PartitionKey) -> StoreResult<usize> {
        self.scan_partition(day).map(|samples| samples.len())
    }
}
