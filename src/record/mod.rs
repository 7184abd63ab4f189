//! Inbound records and outbound lines.
//!
//! ## Contents
//! - [`Record`], [`RecordMetadata`] one unit pulled from the log, with optional position metadata
//! - [`extract_offset`] derives the per-partition sequence position of a record
//! - [`Line`], [`format_line`] the broadcast unit and its text template
//!
//! ## Pipeline
//! ```text
//! Record ──► extract_offset() ──► Ok(offset) ──► format_line(offset, payload) ──► Line
//!                  │
//!                  └──► Err(MissingMetadata) ──► record skipped
//! ```

mod line;
#[allow(clippy::module_inception)]
mod record;

pub use line::{Line, format_line};
pub use record::{Record, RecordMetadata, extract_offset};
