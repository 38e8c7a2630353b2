//! Extension points of the engine
//!
//! - [`store`] - where calibrated samples live ([`SampleStore`])
//! - [`stream`] - where raw readings come from ([`Stream`])

pub mod store;
pub mod stream;

pub use store::SampleStore;
pub use stream::Stream;
