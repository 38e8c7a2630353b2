//! Replay of recorded readings
//!
//! Gateways log what they forward as one reading per line:
//!
//! ```csv
//! ServerDateTime,AnalogIN1
//! 2024-03-10 09:00:00.000,5836
//! 2024-03-10 09:00:05.250,5801
//! ```
//!
//! Timestamps are local to the reference zone. [`ReplayStream`] turns such
//! a log back into [`RawSample`]s so a day can be re-ingested after an
//! outage. A malformed line is reported as `StreamError::Format` and
//! skipped; the next poll continues with the following line.

use std::io::BufRead;

use super::{Stream, StreamError};
use crate::samples::RawSample;
use crate::time::ReferenceZone;

/// Counters for a replay run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Readings decoded successfully
    pub samples_read: usize,
    /// Lines consumed, including skipped and malformed ones
    pub lines_processed: usize,
    /// Lines that could not be decoded
    pub parse_errors: usize,
    /// Bytes read from the source
    pub bytes_read: usize,
}

/// Stream of readings from `timestamp,raw` lines
///
/// ```rust
/// use fuelgauge_core::stream::{ReplayStream, Stream};
/// use fuelgauge_core::ReferenceZone;
///
/// let log = "ServerDateTime,AnalogIN1\n2024-03-10 09:00:00.000,5836\n";
/// let mut stream = ReplayStream::new(log.as_bytes(), ReferenceZone::default())
///     .with_skip_lines(1);
///
/// assert_eq!(stream.poll_next().unwrap().raw_value, 5836);
/// assert!(stream.poll_next().is_err());
/// ```
pub struct ReplayStream<R> {
    reader: R,
    zone: ReferenceZone,
    line: String,
    skip_lines: usize,
    lines_skipped: usize,
    eof: bool,
    stats: ReplayStats,
}

impl<R: BufRead> ReplayStream<R> {
    /// Replay `reader`, interpreting timestamps in `zone`
    pub fn new(reader: R, zone: ReferenceZone) -> Self {
        Self {
            reader,
            zone,
            line: String::new(),
            skip_lines: 0,
            lines_skipped: 0,
            eof: false,
            stats: ReplayStats::default(),
        }
    }

    /// Skip first N lines (useful for headers)
    pub fn with_skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    fn next_line(&mut self) -> Result<bool, StreamError<std::io::Error>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(StreamError::Transport)?;
            if read == 0 {
                return Ok(false);
            }

            self.stats.bytes_read += read;
            self.stats.lines_processed += 1;

            if self.lines_skipped < self.skip_lines {
                self.lines_skipped += 1;
                continue;
            }
            if self.line.trim().is_empty() {
                continue;
            }
            return Ok(true);
        }
    }

    fn parse_line(&self) -> Result<RawSample, StreamError<std::io::Error>> {
        let mut fields = self.line.trim().splitn(2, ',');
        let (Some(timestamp), Some(raw)) = (fields.next(), fields.next()) else {
            return Err(StreamError::Format("Expected timestamp,raw"));
        };

        let timestamp = self
            .zone
            .parse_ingest(timestamp.trim().trim_matches('"'))
            .map_err(|_| StreamError::Format("Invalid timestamp"))?;
        let raw_value = raw
            .trim()
            .parse::<u16>()
            .map_err(|_| StreamError::Format("Invalid raw value"))?;

        Ok(RawSample::new(timestamp, raw_value))
    }
}

impl<R: BufRead> Stream for ReplayStream<R> {
    type Item = RawSample;
    type Error = StreamError<std::io::Error>;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        if self.eof {
            return Err(nb::Error::Other(StreamError::EndOfStream));
        }

        if !self.next_line()? {
            self.eof = true;
            return Err(nb::Error::Other(StreamError::EndOfStream));
        }

        match self.parse_line() {
            Ok(sample) => {
                self.stats.samples_read += 1;
                Ok(sample)
            }
            Err(err) => {
                self.stats.parse_errors += 1;
                log_trace!("Skipping line {}: {:?}", self.stats.lines_processed, err);
                Err(nb::Error::Other(err))
            }
        }
    }
}
