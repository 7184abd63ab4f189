//! # Records consumed from the partitioned log.
//!
//! A [`Record`] is what a [`RecordSource`](crate::RecordSource) hands to the
//! driver: a text payload plus, when the upstream attaches it, the
//! [`RecordMetadata`] describing where the record lives in the log.
//!
//! Synthetic or malformed input may lack metadata entirely; [`extract_offset`]
//! reports that as [`ExtractError::MissingMetadata`] instead of panicking.

use std::sync::Arc;

use crate::error::ExtractError;

/// Position metadata attached by the log consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    /// Topic the record was read from.
    pub topic: Arc<str>,
    /// Partition within the topic.
    pub partition: i32,
    /// Per-partition, monotonically increasing sequence position.
    pub offset: i64,
}

impl RecordMetadata {
    pub fn new(topic: impl Into<Arc<str>>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

/// One unit pulled from the log. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record body as text.
    pub payload: String,
    /// Position metadata, if the upstream attached it.
    pub metadata: Option<RecordMetadata>,
}

impl Record {
    /// Creates a record with position metadata.
    pub fn new(payload: impl Into<String>, metadata: RecordMetadata) -> Self {
        Self {
            payload: payload.into(),
            metadata: Some(metadata),
        }
    }

    /// Creates a record without position metadata.
    pub fn bare(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            metadata: None,
        }
    }

    /// Shorthand for a record on partition 0 of an unnamed topic.
    ///
    /// `None` produces a record without metadata.
    pub fn at(offset: Option<i64>, payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            metadata: offset.map(|o| RecordMetadata::new("", 0, o)),
        }
    }
}

/// Returns the per-partition sequence position of `record`.
///
/// # Errors
/// [`ExtractError::MissingMetadata`] when the record carries no metadata.
///
/// # Example
/// ```
/// use logcast::{ExtractError, Record, RecordMetadata, extract_offset};
///
/// let rec = Record::new("hello", RecordMetadata::new("orders", 3, 42));
/// assert_eq!(extract_offset(&rec), Ok(42));
///
/// let bare = Record::bare("hello");
/// assert_eq!(extract_offset(&bare), Err(ExtractError::MissingMetadata));
/// ```
pub fn extract_offset(record: &Record) -> Result<i64, ExtractError> {
    record
        .metadata
        .as_ref()
        .map(|m| m.offset)
        .ok_or(ExtractError::MissingMetadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_reads_offset_from_metadata() {
        let rec = Record::new("x", RecordMetadata::new("t", 1, 7));
        assert_eq!(extract_offset(&rec), Ok(7));
    }

    #[test]
    fn test_extract_missing_metadata() {
        let rec = Record::at(None, "b");
        assert_eq!(extract_offset(&rec), Err(ExtractError::MissingMetadata));
        assert_eq!(ExtractError::MissingMetadata.as_label(), "missing_metadata");
    }

    #[test]
    fn test_at_builds_partition_zero() {
        let rec = Record::at(Some(10), "a");
        let meta = rec.metadata.expect("metadata");
        assert_eq!(meta.partition, 0);
        assert_eq!(meta.offset, 10);
    }
}
