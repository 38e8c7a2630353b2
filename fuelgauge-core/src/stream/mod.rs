//! Raw reading sources
//!
//! - `memory` - replay a slice of readings (tests, backfills)
//! - `file` - replay recorded `timestamp,raw` lines from any reader

use core::fmt;

#[cfg(feature = "stream-memory")]
pub mod memory;

pub mod file;

#[cfg(feature = "stream-memory")]
pub use memory::MemoryStream;

pub use file::{ReplayStats, ReplayStream};

/// Errors that can occur while pulling readings
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError<E> {
    /// Transport-level error (e.g., I/O error)
    Transport(E),
    /// Record could not be decoded
    Format(&'static str),
    /// End of stream reached
    EndOfStream,
    /// Record longer than the line buffer
    Overflow,
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Format(msg) => write!(f, "Format error: {}", msg),
            Self::EndOfStream => write!(f, "End of stream"),
            Self::Overflow => write!(f, "Record too long"),
        }
    }
}

impl<E> StreamError<E> {
    /// True once the source has nothing more to give
    pub fn is_end(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

pub use crate::traits::Stream;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_display() {
        let err: StreamError<&str> = StreamError::Transport("connection lost");
        assert_eq!(format!("{}", err), "Transport error: connection lost");

        let err: StreamError<&str> = StreamError::EndOfStream;
        assert_eq!(format!("{}", err), "End of stream");
        assert!(err.is_end());
    }
}
