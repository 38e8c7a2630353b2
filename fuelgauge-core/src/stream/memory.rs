//! Memory-based streams for testing and replay

use super::{Stream, StreamError};
use crate::samples::RawSample;

/// Replays a slice of raw readings in order
///
/// ```rust
/// use fuelgauge_core::stream::{MemoryStream, Stream};
/// use fuelgauge_core::RawSample;
///
/// let readings = [RawSample::new(1_000, 5836), RawSample::new(2_000, 4464)];
/// let mut stream = MemoryStream::new(&readings);
///
/// while let Ok(reading) = stream.poll_next() {
///     assert!(reading.raw_value >= 4464);
/// }
/// assert!(stream.is_exhausted());
/// ```
pub struct MemoryStream<'a> {
    samples: &'a [RawSample],
    position: usize,
}

impl<'a> MemoryStream<'a> {
    /// Create new memory stream from slice
    pub fn new(samples: &'a [RawSample]) -> Self {
        Self { samples, position: 0 }
    }

    /// Reset to beginning
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Get current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Check if stream is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl<'a> Stream for MemoryStream<'a> {
    type Item = RawSample;
    type Error = StreamError<()>;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        let sample = self
            .samples
            .get(self.position)
            .copied()
            .ok_or(nb::Error::Other(StreamError::EndOfStream))?;
        self.position += 1;
        Ok(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len() - self.position;
        (remaining, Some(remaining))
    }
}
