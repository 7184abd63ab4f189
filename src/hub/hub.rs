//! # Broadcast hub: single-producer, multi-consumer line fan-out.
//!
//! [`Hub`] keeps the registry of active subscribers and copies every published
//! [`Line`] into each subscriber's bounded queue.
//!
//! ## Architecture
//! ```text
//! publish(line)
//!     │   (registry read lock: stable membership for the whole call)
//!     ├──► [slot 1] bounded queue ──► Subscription 1 .next()
//!     ├──► [slot 2] bounded queue ──► Subscription 2 .next()
//!     └──► [slot N] bounded queue ──► Subscription N .next()
//!
//! register() / unregister(id) / close()   (registry write lock)
//! ```
//!
//! ## Rules
//! - **No replay**: a subscriber only sees lines published after `register()` returned.
//! - **Per-subscriber FIFO**: drops remove lines, they never reorder them.
//! - **Non-blocking**: a full queue applies the [`OverflowPolicy`](super::OverflowPolicy)
//!   instead of waiting; one slow subscriber never stalls the producer or the others.
//! - **Bounded reporting**: `SubscriberLagged` fires when a subscriber starts
//!   losing lines, and again only after it has caught up and fallen behind anew.
//! - **Race-free cancel**: once `unregister` returns, no further line reaches that subscriber.
//! - **No error surface**: failures are observed by subscribers as "the stream ended".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::config::HubConfig;
use super::slot::{Offer, Slot};
use super::subscription::{CloseReason, SubscriberId, Subscription};
use crate::events::{Bus, Event, EventKind};
use crate::record::Line;

struct Registry {
    slots: HashMap<SubscriberId, Arc<Slot>>,
    closed: bool,
}

pub(crate) struct HubInner {
    registry: RwLock<Registry>,
    cfg: HubConfig,
    bus: Option<Bus>,
    next_id: AtomicU64,
}

impl HubInner {
    fn emit(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }

    /// Removes a subscriber and closes its queue.
    pub(crate) fn remove(&self, id: SubscriberId, reason: CloseReason) -> bool {
        let slot = self.registry.write().slots.remove(&id);
        match slot {
            Some(slot) => {
                slot.close();
                tracing::debug!(subscriber = %id, reason = reason.as_label(), "subscriber removed");
                self.emit(Event::subscriber_closed(id, reason));
                true
            }
            None => false,
        }
    }
}

/// Fan-out engine shared between the driver and the transports.
///
/// Cheap to clone; all clones refer to the same registry.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// Creates a standalone hub (no runtime events are published).
    pub fn new(cfg: HubConfig) -> Self {
        Self::build(cfg, None)
    }

    /// Creates a hub that reports subscriber lifecycle and lag on `bus`.
    pub fn with_bus(cfg: HubConfig, bus: Bus) -> Self {
        Self::build(cfg, Some(bus))
    }

    fn build(cfg: HubConfig, bus: Option<Bus>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                registry: RwLock::new(Registry {
                    slots: HashMap::new(),
                    closed: false,
                }),
                cfg,
                bus,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the hub configuration.
    pub fn config(&self) -> &HubConfig {
        &self.inner.cfg
    }

    /// Registers a new subscriber with an empty backlog.
    ///
    /// After [`close`](Self::close) this returns an already-closed subscription.
    pub fn register(&self) -> Subscription {
        let id = SubscriberId::from_raw(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let weak = Arc::downgrade(&self.inner);

        let slot = {
            let mut reg = self.inner.registry.write();
            if reg.closed {
                None
            } else {
                let slot = Arc::new(Slot::new(id, &self.inner.cfg));
                reg.slots.insert(id, Arc::clone(&slot));
                Some(slot)
            }
        };

        match slot {
            Some(slot) => {
                tracing::debug!(subscriber = %id, "subscriber registered");
                self.inner
                    .emit(Event::new(EventKind::SubscriberRegistered).with_subscriber(id));
                Subscription::new(slot, weak)
            }
            None => Subscription::new(Arc::new(Slot::closed(id, &self.inner.cfg)), weak),
        }
    }

    /// Removes a subscriber; its pending lines are discarded.
    ///
    /// Safe to call while a `publish` is in flight. Returns `false` if the id
    /// is not (or no longer) registered.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.inner.remove(id, CloseReason::Cancelled)
    }

    /// Delivers `line` to every subscriber registered at the moment of the call.
    ///
    /// Returns how many subscribers queued the line. Never waits on a
    /// subscriber; overflow is resolved by the configured policy.
    pub fn publish(&self, line: Line) -> usize {
        let reg = self.inner.registry.read();
        let mut delivered = 0;

        for slot in reg.slots.values() {
            match slot.offer(line.clone()) {
                Offer::Accepted => delivered += 1,
                Offer::Evicted { report } => {
                    delivered += 1;
                    if report {
                        self.lagged(slot);
                    }
                }
                Offer::Rejected { report: true } => self.lagged(slot),
                Offer::Rejected { report: false } | Offer::Closed => {}
            }
        }
        delivered
    }

    fn lagged(&self, slot: &Slot) {
        tracing::debug!(subscriber = %slot.id(), dropped = slot.dropped(), "subscriber lagging");
        self.inner.emit(
            Event::new(EventKind::SubscriberLagged)
                .with_subscriber(slot.id())
                .with_dropped(slot.dropped()),
        );
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.inner.registry.read().slots.len()
    }

    /// True if no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.registry.read().slots.is_empty()
    }

    /// True once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.registry.read().closed
    }

    /// Tears the hub down.
    ///
    /// Every subscriber stops accepting lines, receives what is already
    /// queued, then observes `Closed`. Idempotent.
    pub fn close(&self) {
        let drained: Vec<Arc<Slot>> = {
            let mut reg = self.inner.registry.write();
            if reg.closed {
                return;
            }
            reg.closed = true;
            reg.slots.drain().map(|(_, slot)| slot).collect()
        };

        for slot in &drained {
            slot.drain();
            self.inner
                .emit(Event::subscriber_closed(slot.id(), CloseReason::HubClosed));
        }
        tracing::info!(subscribers = drained.len(), "hub closed");
        self.inner.emit(Event::new(EventKind::HubClosed));
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("subscribers", &self.len())
            .field("cfg", &self.inner.cfg)
            .finish()
    }
}
