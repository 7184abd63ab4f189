//! # Channel-backed record source.
//!
//! [`ChannelSource`] adapts a tokio mpsc channel into a [`RecordSource`]. An
//! application that already owns a queue client pushes records (or errors)
//! through a [`ChannelSourceHandle`]; the relay pulls them in order.
//!
//! ```text
//! queue client ──► ChannelSourceHandle::send() ──► [mpsc, bounded] ──► ChannelSource ──► driver
//! ```
//!
//! The stream ends (`Ok(None)`) once every handle is dropped.

use std::borrow::Cow;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::RecordSource;
use crate::error::SourceError;
use crate::record::Record;

type Item = Result<Record, SourceError>;

/// Sending side of a [`ChannelSource`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ChannelSourceHandle {
    tx: mpsc::Sender<Item>,
}

impl ChannelSourceHandle {
    /// Sends a record, waiting while the channel is full.
    ///
    /// Returns the record back if the source was dropped.
    pub async fn send(&self, record: Record) -> Result<(), Record> {
        match self.tx.reserve().await {
            Ok(permit) => {
                permit.send(Ok(record));
                Ok(())
            }
            Err(_closed) => Err(record),
        }
    }

    /// Injects an upstream failure into the stream.
    ///
    /// Returns `false` if the source was dropped.
    pub async fn fail(&self, error: SourceError) -> bool {
        self.tx.send(Err(error)).await.is_ok()
    }

    /// True once the receiving source was dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side: a [`RecordSource`] over a bounded mpsc channel.
#[derive(Debug)]
pub struct ChannelSource {
    name: Cow<'static, str>,
    rx: mpsc::Receiver<Item>,
}

impl ChannelSource {
    /// Creates a source and its handle with the given channel capacity (min 1).
    pub fn new(name: impl Into<Cow<'static, str>>, capacity: usize) -> (Self, ChannelSourceHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                name: name.into(),
                rx,
            },
            ChannelSourceHandle { tx },
        )
    }
}

#[async_trait]
impl RecordSource for ChannelSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        match self.rx.recv().await {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_errors_and_end() {
        let (mut source, handle) = ChannelSource::new("test", 4);
        assert_eq!(source.name(), "test");

        handle.send(Record::at(Some(1), "a")).await.expect("send");
        assert!(handle.fail(SourceError::fail("broker down")).await);
        drop(handle);

        assert_eq!(
            source.next_record().await,
            Ok(Some(Record::at(Some(1), "a")))
        );
        assert_eq!(
            source.next_record().await,
            Err(SourceError::fail("broker down"))
        );
        assert_eq!(source.next_record().await, Ok(None));
    }

    #[tokio::test]
    async fn test_send_after_drop_returns_record() {
        let (source, handle) = ChannelSource::new("test", 1);
        drop(source);
        assert!(handle.is_closed());
        let back = handle.send(Record::bare("lost")).await.expect_err("closed");
        assert_eq!(back.payload, "lost");
    }
}
