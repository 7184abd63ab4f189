//! # LogWriter: runtime events as `tracing` records
//!
//! A minimal observer that forwards incoming [`Event`]s to `tracing` under the
//! `logcast::events` target. Install any `tracing` subscriber (e.g.
//! `tracing-subscriber` with `EnvFilter`) to see them.
//!
//! ## Levels
//! - `warn`: upstream failures, grace exceeded, observer panics/overflow
//! - `info`: subscriber joins/leaves, shutdown, backoff, end of stream
//! - `debug`: skipped records, subscriber lag

use crate::events::{Event, EventKind};
use crate::observers::Observe;
use async_trait::async_trait;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let sub = e.subscriber.map(|id| id.get());
        let source = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::RecordSkipped => {
                tracing::debug!(target: "logcast::events", seq = e.seq, source, reason, "record skipped");
            }
            EventKind::SubscriberRegistered => {
                tracing::info!(target: "logcast::events", seq = e.seq, subscriber = ?sub, "subscriber registered");
            }
            EventKind::SubscriberClosed => {
                tracing::info!(target: "logcast::events", seq = e.seq, subscriber = ?sub, reason, "subscriber closed");
            }
            EventKind::SubscriberLagged => {
                tracing::debug!(target: "logcast::events", seq = e.seq, subscriber = ?sub, dropped = ?e.dropped, "subscriber lagging");
            }
            EventKind::UpstreamFailed => {
                tracing::warn!(target: "logcast::events", seq = e.seq, source, attempt = ?e.attempt, reason, "upstream failed");
            }
            EventKind::BackoffScheduled => {
                tracing::info!(target: "logcast::events", seq = e.seq, source, delay_ms = ?e.delay_ms, attempt = ?e.attempt, "backoff scheduled");
            }
            EventKind::UpstreamEnded => {
                tracing::info!(target: "logcast::events", seq = e.seq, source, "upstream ended");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "logcast::events", seq = e.seq, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "logcast::events", seq = e.seq, "stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: "logcast::events", seq = e.seq, "grace exceeded");
            }
            EventKind::HubClosed => {
                tracing::info!(target: "logcast::events", seq = e.seq, "hub closed");
            }
            EventKind::ObserverPanicked | EventKind::ObserverOverflow => {
                tracing::warn!(target: "logcast::events", seq = e.seq, observer = source, reason, dropped = ?e.dropped, kind = ?e.kind, "observer trouble");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
