//! Bounded Ingestion Queue
//!
//! ## Overview
//!
//! Sensor gateways push raw readings from their own threads (an MQTT event
//! loop, a serial reader) while the ingestor appends to the store at its own
//! pace. [`IngestQueue`] sits between them:
//!
//! ```text
//! Producers (gateways)                  Consumer (Ingestor)
//!      ↓      ↓                               ↓
//!   enqueue ─────→ MPMC ring buffer ←──── dequeue
//!      ↓                                      ↓
//!   never blocks;                        calibrate + append
//!   full = sample handed back
//! ```
//!
//! The ring buffer is `heapless::mpmc::MpMcQueue`: fixed capacity, no
//! allocation after construction, and no locks on either side. Capacity
//! must be a power of two.
//!
//! ## Overflow
//!
//! A full queue does not drop silently: [`IngestQueue::push`] returns the
//! rejected sample so the producer can retry, spill or count it. Every
//! rejection also shows up in [`QueueStats::dropped`].
//!
//! ## Statistics
//!
//! Counters are `Relaxed` atomics. They are monitoring data and never drive
//! control flow, so a momentarily stale depth is acceptable.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::MpMcQueue;

use crate::samples::RawSample;

/// Default queue capacity (samples)
pub const QUEUE_CAPACITY: usize = 256;

const _: () = assert!(
    QUEUE_CAPACITY.is_power_of_two(),
    "Queue capacity must be power of 2"
);

/// Queue health counters
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Samples accepted
    pub pushed: AtomicU32,
    /// Samples handed to the consumer
    pub popped: AtomicU32,
    /// Samples rejected because the queue was full
    pub dropped: AtomicU32,
    /// Deepest backlog observed
    pub max_depth: AtomicU32,
}

impl QueueStats {
    const fn new() -> Self {
        Self {
            pushed: AtomicU32::new(0),
            popped: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            max_depth: AtomicU32::new(0),
        }
    }

    fn update_max_depth(&self, current: u32) {
        let mut max = self.max_depth.load(Ordering::Relaxed);
        while current > max {
            match self.max_depth.compare_exchange_weak(
                max,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`QueueStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Samples accepted
    pub pushed: u32,
    /// Samples handed to the consumer
    pub popped: u32,
    /// Samples rejected because the queue was full
    pub dropped: u32,
    /// Deepest backlog observed
    pub max_depth: u32,
}

/// Multi-producer, multi-consumer queue of raw readings
///
/// ```rust
/// use fuelgauge_core::queue::IngestQueue;
/// use fuelgauge_core::RawSample;
///
/// static QUEUE: IngestQueue<64> = IngestQueue::new();
///
/// QUEUE.push(RawSample::new(1_000, 4464)).unwrap();
/// assert_eq!(QUEUE.pop(), Some(RawSample::new(1_000, 4464)));
/// ```
pub struct IngestQueue<const N: usize> {
    ring: MpMcQueue<RawSample, N>,
    stats: QueueStats,
}

impl<const N: usize> IngestQueue<N> {
    /// Empty queue; usable in `static` context
    pub const fn new() -> Self {
        Self {
            ring: MpMcQueue::new(),
            stats: QueueStats::new(),
        }
    }

    /// Enqueue a reading, handing it back if the queue is full
    pub fn push(&self, sample: RawSample) -> Result<(), RawSample> {
        match self.ring.enqueue(sample) {
            Ok(()) => {
                let pushed = self.stats.pushed.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
                let popped = self.stats.popped.load(Ordering::Relaxed);
                self.stats.update_max_depth(pushed.wrapping_sub(popped));
                Ok(())
            }
            Err(rejected) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                log_warn!(
                    "Ingest queue full ({} slots), rejecting sample at {}ms",
                    N,
                    rejected.timestamp
                );
                Err(rejected)
            }
        }
    }

    /// Dequeue the oldest reading
    pub fn pop(&self) -> Option<RawSample> {
        let sample = self.ring.dequeue()?;
        self.stats.popped.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }

    /// Approximate number of queued readings
    ///
    /// Counters wrap; their difference stays exact while the backlog is
    /// below `u32::MAX`.
    pub fn len(&self) -> usize {
        let snapshot = self.stats.snapshot();
        snapshot.pushed.wrapping_sub(snapshot.popped) as usize
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued readings
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Pop until empty
    pub fn drain(&self) -> QueueDrain<'_, N> {
        QueueDrain { queue: self }
    }
}

impl<const N: usize> Default for IngestQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`IngestQueue::drain`]
pub struct QueueDrain<'a, const N: usize> {
    queue: &'a IngestQueue<N>,
}

impl<'a, const N: usize> Iterator for QueueDrain<'a, N> {
    type Item = RawSample;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop()
    }
}
