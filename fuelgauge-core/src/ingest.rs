//! Calibrate-and-Append Ingestion
//!
//! Every raw reading takes the same path:
//!
//! ```text
//! RawSample ──► Calibrator ──► CalibratedSample ──► partition_of(ts) ──► store.append
//! ```
//!
//! Calibration is total, so a reading is only refused when its timestamp
//! has no calendar day or the store fails. Readings may arrive in any
//! order; the store keeps each partition sorted.
//!
//! Three entry points feed the same path: single readings
//! ([`Ingestor::ingest`]), a bounded hand-off queue
//! ([`Ingestor::drain_queue`]) and a pull [`Stream`]
//! ([`Ingestor::pump`]). The bulk entry points skip readings without a
//! calendar day and count them in the returned [`IngestReport`]. A store
//! failure stops them instead: the reading that was not stored comes back
//! in [`IngestInterrupted`] so the caller can retry it, and anything not
//! yet pulled stays in its queue or stream.

use core::fmt;
use std::sync::Arc;

use thiserror_no_std::Error;

use crate::calibration::Calibrator;
use crate::errors::{IngestError, IngestResult, StoreError};
use crate::queue::IngestQueue;
use crate::samples::{CalibratedSample, RawSample};
use crate::stream::StreamError;
use crate::time::ReferenceZone;
use crate::traits::{SampleStore, Stream};

/// Outcome of a bulk ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Readings calibrated and stored
    pub ingested: usize,
    /// Readings without a calendar day
    pub rejected: usize,
    /// Records the source could not decode
    pub malformed: usize,
    /// Source reported end of stream
    pub finished: bool,
}

/// Bulk ingestion stopped by a store failure
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Ingestion stopped at {}ms after {} readings: {}", .sample.timestamp, .report.ingested, .error)]
pub struct IngestInterrupted {
    /// Progress before the failure
    pub report: IngestReport,
    /// Reading that was not stored
    pub sample: RawSample,
    /// Why the store refused it
    pub error: StoreError,
}

/// Why [`Ingestor::pump`] stopped early
#[derive(Debug, Clone, PartialEq)]
pub enum PumpError<E> {
    /// The stream's transport failed
    Stream(StreamError<E>),
    /// The store failed an append
    Interrupted(IngestInterrupted),
}

impl<E: fmt::Display> fmt::Display for PumpError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "{}", e),
            Self::Interrupted(e) => write!(f, "{}", e),
        }
    }
}

/// Turns raw readings into stored calibrated samples
#[derive(Debug)]
pub struct Ingestor<S> {
    calibrator: Calibrator,
    store: Arc<S>,
    zone: ReferenceZone,
}

impl<S> Clone for Ingestor<S> {
    fn clone(&self) -> Self {
        Self {
            calibrator: self.calibrator.clone(),
            store: Arc::clone(&self.store),
            zone: self.zone,
        }
    }
}

impl<S: SampleStore> Ingestor<S> {
    /// Ingestor writing to `store`, partitioning by `zone`
    pub fn new(calibrator: Calibrator, store: Arc<S>, zone: ReferenceZone) -> Self {
        Self { calibrator, store, zone }
    }

    /// The calibrator in use
    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Zone that local timestamps and day partitions are read in
    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Calibrate one reading and append it to its day
    pub fn ingest(&self, raw: RawSample) -> IngestResult<CalibratedSample> {
        let day = self.zone.partition_of(raw.timestamp)?;
        let sample = self.calibrator.calibrate_sample(raw);
        self.store.append(day, sample)?;

        log_trace!(
            "Stored {}ms raw={} liters={} in {}",
            raw.timestamp,
            raw.raw_value,
            sample.liters,
            day
        );
        Ok(sample)
    }

    /// Ingest a batch, skipping readings without a day and stopping at the
    /// first store failure
    pub fn ingest_all<I>(&self, readings: I) -> Result<IngestReport, IngestInterrupted>
    where
        I: IntoIterator<Item = RawSample>,
    {
        let mut report = IngestReport::default();
        for raw in readings {
            self.step(&mut report, raw)?;
        }
        Ok(report)
    }

    /// Ingest everything currently queued.
    ///
    /// On a store failure the failed reading is returned and the rest stay
    /// queued.
    pub fn drain_queue<const N: usize>(
        &self,
        queue: &IngestQueue<N>,
    ) -> Result<IngestReport, IngestInterrupted> {
        self.ingest_all(queue.drain())
    }

    /// Pull from `stream` until it would block or ends.
    ///
    /// Undecodable records are counted and skipped. A transport or store
    /// failure stops the pump and is returned; readings stored before it
    /// stay stored.
    pub fn pump<T, E>(&self, stream: &mut T) -> Result<IngestReport, PumpError<E>>
    where
        T: Stream<Item = RawSample, Error = StreamError<E>>,
    {
        let mut report = IngestReport::default();
        loop {
            match stream.poll_next() {
                Ok(raw) => self.step(&mut report, raw).map_err(PumpError::Interrupted)?,
                Err(nb::Error::WouldBlock) => return Ok(report),
                Err(nb::Error::Other(StreamError::EndOfStream)) => {
                    report.finished = true;
                    return Ok(report);
                }
                Err(nb::Error::Other(StreamError::Format(_) | StreamError::Overflow)) => {
                    report.malformed += 1;
                }
                Err(nb::Error::Other(err)) => return Err(PumpError::Stream(err)),
            }
        }
    }

    fn step(&self, report: &mut IngestReport, raw: RawSample) -> Result<(), IngestInterrupted> {
        match self.ingest(raw) {
            Ok(_) => report.ingested += 1,
            Err(IngestError::InvalidTimestamp(err)) => {
                log_warn!("Dropping reading at {}ms: {}", raw.timestamp, err);
                report.rejected += 1;
            }
            Err(IngestError::Store(error)) => {
                log_warn!("Store failed at {}ms: {}", raw.timestamp, error);
                return Err(IngestInterrupted { report: *report, sample: raw, error });
            }
        }
        Ok(())
    }
}
