//! # Non-blocking event fan-out to multiple observers.
//!
//! Provides [`ObserverSet`] which distributes runtime events to multiple
//! observers concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_event()
//!     │    (bounded)         └──────► panic → ObserverPanicked
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► observerN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-observer ordering**: observer A may process event N while B processes N+5
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: slow/panicking observer doesn't affect others
//! - **Per-observer FIFO**: each observer sees events in order
//! - **Overflow**: the event is dropped for that observer only. One
//!   `ObserverOverflow` is published when an observer starts dropping; the
//!   next one only after a delivery to it succeeded again. A stalled observer
//!   therefore cannot flood the bus it is fed from.
//!
//! ## Panic handling
//! Workers run each `on_event` under `catch_unwind`; a panic becomes an
//! `ObserverPanicked` event and the worker moves on. `AssertUnwindSafe` is
//! used, so an observer that panics while holding a lock may leave its own
//! state inconsistent.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::observers::Observe;

/// Feeding side of one observer worker.
struct Feed {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    dropped: AtomicU64,
    overflowing: AtomicBool,
}

impl Feed {
    /// Records one lost event; returns the running total if this loss opens
    /// a new overflow episode.
    fn lose(&self) -> Option<u64> {
        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        (!self.overflowing.swap(true, Ordering::Relaxed)).then_some(total)
    }
}

/// Fan-out coordinator for runtime event observers.
pub struct ObserverSet {
    feeds: Vec<Feed>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ObserverSet {
    /// Creates a new set and spawns one worker task per observer.
    ///
    /// Must be called from within a tokio runtime. Minimum queue capacity is 1.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, bus: Bus) -> Self {
        let (feeds, workers) = observers
            .into_iter()
            .map(|obs| {
                let (tx, rx) = mpsc::channel(obs.queue_capacity().max(1));
                let feed = Feed {
                    name: obs.name(),
                    tx,
                    dropped: AtomicU64::new(0),
                    overflowing: AtomicBool::new(false),
                };
                (feed, tokio::spawn(worker(obs, rx, bus.clone())))
            })
            .unzip();

        Self {
            feeds,
            workers,
            bus,
        }
    }

    /// Emits a pre-allocated `Arc<Event>` to all observers without waiting.
    ///
    /// A full or closed queue loses the event for that observer. Overflow
    /// reports are never themselves reported as overflowing.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let reportable = !event.is_observer_overflow();

        for feed in &self.feeds {
            let reason = match feed.tx.try_send(Arc::clone(&event)) {
                Ok(()) => {
                    feed.overflowing.store(false, Ordering::Relaxed);
                    continue;
                }
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !reportable {
                feed.dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            if let Some(total) = feed.lose() {
                tracing::debug!(observer = feed.name, reason, dropped = total, "observer overflowing");
                self.bus
                    .publish(Event::observer_overflow(feed.name, reason).with_dropped(total));
            }
        }
    }

    /// Emits an event to all observers (clones the event).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Events lost so far by the named observer, across all overflow episodes.
    #[must_use]
    pub fn dropped(&self, observer: &str) -> Option<u64> {
        self.feeds
            .iter()
            .find(|feed| feed.name == observer)
            .map(|feed| feed.dropped.load(Ordering::Relaxed))
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.feeds);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Drains one observer's queue until every sender is gone.
async fn worker(obs: Arc<dyn Observe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let outcome = std::panic::AssertUnwindSafe(obs.on_event(&ev))
            .catch_unwind()
            .await;
        if let Err(payload) = outcome {
            let info = panic_message(payload.as_ref());
            tracing::warn!(observer = obs.name(), panic = %info, "observer panicked");
            bus.publish(Event::observer_panicked(obs.name(), info));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|msg| (*msg).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
