//! # Runtime events emitted by the relay, the driver and the hub.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Record events**: per-record outcomes that do not reach subscribers (skipped records)
//! - **Subscriber events**: hub membership and lag (registered, closed, lagged)
//! - **Upstream events**: record source failures, retries and end of stream
//! - **Shutdown events**: OS signal, grace period outcome, hub teardown
//!
//! The [`Event`] struct carries optional metadata (subscriber id, source name,
//! reason, offset, counters) depending on the kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use logcast::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RecordSkipped)
//!     .with_source("orders")
//!     .with_reason("missing_metadata");
//!
//! assert_eq!(ev.kind, EventKind::RecordSkipped);
//! assert_eq!(ev.source.as_deref(), Some("orders"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::hub::{CloseReason, SubscriberId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `source`: observer name
    /// - `reason`: panic info/message
    ObserverPanicked,

    /// Observer started dropping events (queue full or worker closed).
    ///
    /// Published once per overflow episode, not per lost event.
    ///
    /// Sets:
    /// - `source`: observer name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `dropped`: events lost by this observer so far
    ObserverOverflow,

    // === Record events ===
    /// A record was discarded before formatting.
    ///
    /// Sets:
    /// - `source`: record source name
    /// - `reason`: extraction error label (e.g., "missing_metadata")
    RecordSkipped,

    // === Subscriber events ===
    /// A subscriber joined the hub.
    ///
    /// Sets:
    /// - `subscriber`: subscriber id
    SubscriberRegistered,

    /// A subscriber left the hub (terminal).
    ///
    /// Sets:
    /// - `subscriber`: subscriber id
    /// - `reason`: [`CloseReason::as_label`]
    SubscriberClosed,

    /// A subscriber started losing lines to queue overflow.
    ///
    /// Published once per lag episode; the next one follows only after the
    /// subscriber emptied its queue.
    ///
    /// Sets:
    /// - `subscriber`: subscriber id
    /// - `dropped`: total lines dropped for this subscriber so far
    SubscriberLagged,

    // === Upstream events ===
    /// The record source failed to deliver the next record.
    ///
    /// Sets:
    /// - `source`: record source name
    /// - `attempt`: consecutive failure count (1-based)
    /// - `reason`: failure message
    UpstreamFailed,

    /// Next pull scheduled after an upstream failure.
    ///
    /// Sets:
    /// - `source`: record source name
    /// - `attempt`: consecutive failure count
    /// - `delay_ms`: delay before the next pull (ms)
    /// - `reason`: last failure message
    BackoffScheduled,

    /// The record source signalled end of stream.
    ///
    /// Sets:
    /// - `source`: record source name
    UpstreamEnded,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// The driver stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; the driver did not stop in time.
    GraceExceeded,

    /// The hub was torn down; remaining subscribers drain and close.
    HubClosed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Subscriber the event refers to, if any.
    pub subscriber: Option<SubscriberId>,
    /// Record source or observer name, if applicable.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, close reasons, overflow details).
    pub reason: Option<Arc<str>>,
    /// Consecutive failure count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before next pull in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Total lines dropped for a lagging subscriber.
    pub dropped: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subscriber: None,
            source: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            dropped: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a record source (or observer) name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a subscriber id.
    #[inline]
    pub fn with_subscriber(mut self, id: SubscriberId) -> Self {
        self.subscriber = Some(id);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a dropped-lines counter.
    #[inline]
    pub fn with_dropped(mut self, n: u64) -> Self {
        self.dropped = Some(n);
        self
    }

    /// Creates a subscriber-closed event.
    #[inline]
    pub fn subscriber_closed(id: SubscriberId, reason: CloseReason) -> Self {
        Event::new(EventKind::SubscriberClosed)
            .with_subscriber(id)
            .with_reason(reason.as_label())
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_source(observer)
            .with_reason(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_source(observer)
            .with_reason(info)
    }

    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, EventKind::ObserverOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::HubClosed);
        let b = Event::new(EventKind::HubClosed);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_saturates_at_u32() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(u64::MAX / 4));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_closed_carries_label() {
        let ev = Event::subscriber_closed(SubscriberId::from_raw(7), CloseReason::SinkFailure);
        assert_eq!(ev.subscriber, Some(SubscriberId::from_raw(7)));
        assert_eq!(ev.reason.as_deref(), Some("sink_failure"));
    }
}
