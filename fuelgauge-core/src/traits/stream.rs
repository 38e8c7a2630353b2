//! Stream Processing Traits
//!
//! Readings reach the engine through a pull-based source. The model uses
//! the `nb` crate for non-blocking reads, so a source backed by a serial
//! port, a replay file or an in-memory slice looks the same to the
//! [`Ingestor`](crate::ingest::Ingestor).
//!
//! ```rust
//! use fuelgauge_core::traits::Stream;
//!
//! fn pump<S: Stream>(stream: &mut S, mut sink: impl FnMut(S::Item)) -> Result<(), S::Error> {
//!     loop {
//!         match stream.poll_next() {
//!             Ok(item) => sink(item),
//!             Err(nb::Error::WouldBlock) => return Ok(()),
//!             Err(nb::Error::Other(e)) => return Err(e),
//!         }
//!     }
//! }
//! ```

/// Pull-based source of items
///
/// Streams use a two-level error model:
/// - `nb::Error::WouldBlock` - nothing available right now, poll again later
/// - `nb::Error::Other(E)` - the source failed or ended
pub trait Stream {
    /// Type of items produced by the stream
    type Item;

    /// Type of errors that can occur
    type Error;

    /// Attempt to pull the next item without blocking
    ///
    /// End of input should be reported consistently once reached.
    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error>;

    /// Bounds on remaining items, like `Iterator::size_hint()`
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
