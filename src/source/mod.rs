//! Record sources: where the relay gets its records from.
//!
//! - [`RecordSource`] trait implemented by log-consumer adapters
//! - [`ChannelSource`], [`ChannelSourceHandle`] mpsc-backed implementation for embedding and tests

mod channel;
#[allow(clippy::module_inception)]
mod source;

pub use channel::{ChannelSource, ChannelSourceHandle};
pub use source::RecordSource;
