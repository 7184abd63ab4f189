//! # Subscription: one client's view of the broadcast.
//!
//! A [`Subscription`] is returned by [`Hub::register`](crate::Hub::register). It
//! yields the lines published after registration, in publish order, possibly
//! with gaps when the subscriber's queue overflowed.
//!
//! ## Lifecycle
//! ```text
//! register() ──► Active ──next()──► Some(line) ...
//!                  │
//!                  ├── cancel() / drop / Hub::unregister ──► Closed (pending lines discarded)
//!                  ├── sink_failed()                     ──► Closed (reported as sink failure)
//!                  └── Hub::close()                      ──► pending lines, then Closed
//!
//! Closed: next() returns None forever.
//! ```
//!
//! Dropping a subscription unregisters it, so a transport that simply drops
//! the subscription when the client goes away never leaks hub memory.

use std::fmt;
use std::sync::{Arc, Weak};

use futures::Stream;

use super::hub::HubInner;
use super::slot::{Slot, Take};
use crate::record::Line;

/// Unique identity of a subscriber within a hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Numeric value of this id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Why a subscriber left the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// Explicit cancellation by the owner (or the subscription was dropped).
    Cancelled,
    /// The outbound transport reported the client is gone.
    SinkFailure,
    /// The hub was torn down.
    HubClosed,
}

impl CloseReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CloseReason::Cancelled => "cancelled",
            CloseReason::SinkFailure => "sink_failure",
            CloseReason::HubClosed => "hub_closed",
        }
    }
}

/// Handle over one subscriber's feed.
///
/// `next()` takes `&mut self`: one subscription has exactly one consumer.
pub struct Subscription {
    slot: Arc<Slot>,
    hub: Weak<HubInner>,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(slot: Arc<Slot>, hub: Weak<HubInner>) -> Self {
        Self {
            slot,
            hub,
            detached: false,
        }
    }

    /// Identity of this subscriber.
    pub fn id(&self) -> SubscriberId {
        self.slot.id()
    }

    /// Number of lines lost to queue overflow so far.
    pub fn dropped(&self) -> u64 {
        self.slot.dropped()
    }

    /// True once the subscriber reached its terminal state.
    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }

    /// Waits for the next line.
    ///
    /// Returns `None` once the subscription is closed; every later call
    /// returns `None` as well. Suspends without polling while the queue is
    /// empty. No timeout is applied; wrap the call in `tokio::time::timeout`
    /// if one is needed.
    pub async fn next(&mut self) -> Option<Line> {
        loop {
            let notified = self.slot.notify().notified();
            match self.slot.take() {
                Take::Line(line) => return Some(line),
                Take::Closed => return None,
                Take::Empty => {}
            }
            notified.await;
        }
    }

    /// Returns the next line if one is already pending, without waiting.
    ///
    /// `Ok(None)` means the queue is empty; `Err(())` means closed.
    #[allow(clippy::result_unit_err)]
    pub fn try_next(&mut self) -> Result<Option<Line>, ()> {
        match self.slot.take() {
            Take::Line(line) => Ok(Some(line)),
            Take::Empty => Ok(None),
            Take::Closed => Err(()),
        }
    }

    /// Cancels the subscription. Pending lines are discarded.
    pub fn cancel(mut self) {
        self.detach(CloseReason::Cancelled);
    }

    /// Reports that the client behind this subscription is gone.
    ///
    /// Same effect as [`cancel`](Self::cancel), but observers see the close
    /// reason as a sink failure.
    pub fn sink_failed(mut self) {
        self.detach(CloseReason::SinkFailure);
    }

    /// Converts the subscription into a `Stream` of lines.
    ///
    /// The stream ends when the subscription closes. Dropping the stream
    /// cancels the subscription.
    pub fn into_stream(self) -> impl Stream<Item = Line> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|line| (line, sub))
        })
    }

    fn detach(&mut self, reason: CloseReason) {
        if self.detached {
            return;
        }
        self.detached = true;
        match self.hub.upgrade() {
            Some(hub) => {
                hub.remove(self.slot.id(), reason);
            }
            None => {
                self.slot.close();
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach(CloseReason::Cancelled);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.slot.id())
            .field("dropped", &self.slot.dropped())
            .field("closed", &self.slot.is_closed())
            .finish()
    }
}
