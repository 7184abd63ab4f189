//! # Per-subscriber bounded queue.
//!
//! A [`Slot`] is the hub-side state of one subscriber: its pending lines, its
//! lifecycle state and a wakeup notification for the consumer.
//!
//! ## State machine
//! ```text
//! Active ──offer()──► Active            (line queued, or a line dropped on overflow)
//! Active ──close()──► Closed            (cancel / sink failure: pending lines discarded)
//! Active ──drain()──► Draining ──take() on empty──► Closed   (hub teardown)
//! Closed is absorbing.
//! ```
//!
//! ## Rules
//! - Each slot has its own mutex; the hub never holds two slot locks at once.
//! - `offer` never blocks beyond the slot mutex.
//! - After `close()` returns, `take()` never yields a line.
//! - Lag is reported once per episode: the first overflow after the consumer
//!   last emptied its queue carries `report: true`, later ones do not.
//!   The `dropped` counter stays exact regardless.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::config::{HubConfig, OverflowPolicy};
use super::subscription::SubscriberId;
use crate::record::Line;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Active,
    Draining,
    Closed,
}

/// Outcome of offering a line to one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Offer {
    /// Queued without loss.
    Accepted,
    /// Queued after evicting the oldest pending line.
    Evicted { report: bool },
    /// Not queued: the queue was full and the policy keeps older lines.
    Rejected { report: bool },
    /// Not queued: the slot no longer accepts lines.
    Closed,
}

/// Result of a non-waiting read.
#[derive(Debug)]
pub(crate) enum Take {
    Line(Line),
    Empty,
    Closed,
}

struct Queue {
    lines: VecDeque<Line>,
    state: SlotState,
    /// Set on the first overflow; cleared once the consumer empties the queue.
    lagging: bool,
}

impl Queue {
    /// Marks the queue as lagging; true only on the transition.
    fn start_lagging(&mut self) -> bool {
        !std::mem::replace(&mut self.lagging, true)
    }
}

pub(crate) struct Slot {
    id: SubscriberId,
    capacity: usize,
    overflow: OverflowPolicy,
    queue: Mutex<Queue>,
    notify: Notify,
    dropped: AtomicU64,
}

impl Slot {
    pub(crate) fn new(id: SubscriberId, cfg: &HubConfig) -> Self {
        let capacity = cfg.queue_capacity_clamped();
        Self {
            id,
            capacity,
            overflow: cfg.overflow,
            queue: Mutex::new(Queue {
                lines: VecDeque::with_capacity(capacity.min(1024)),
                state: SlotState::Active,
                lagging: false,
            }),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// A slot that was never registered (hub already closed).
    pub(crate) fn closed(id: SubscriberId, cfg: &HubConfig) -> Self {
        let slot = Self::new(id, cfg);
        slot.queue.lock().state = SlotState::Closed;
        slot
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn notify(&self) -> &Notify {
        &self.notify
    }

    /// Enqueues `line` according to the overflow policy.
    pub(crate) fn offer(&self, line: Line) -> Offer {
        let outcome = {
            let mut q = self.queue.lock();
            if q.state != SlotState::Active {
                return Offer::Closed;
            }
            if q.lines.len() < self.capacity {
                q.lines.push_back(line);
                Offer::Accepted
            } else {
                let report = q.start_lagging();
                match self.overflow {
                    OverflowPolicy::DropOldest => {
                        q.lines.pop_front();
                        q.lines.push_back(line);
                        Offer::Evicted { report }
                    }
                    OverflowPolicy::DropNewest => Offer::Rejected { report },
                }
            }
        };

        match outcome {
            Offer::Accepted => self.notify.notify_one(),
            Offer::Evicted { .. } => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.notify.notify_one();
            }
            Offer::Rejected { .. } => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Offer::Closed => {}
        }
        outcome
    }

    /// Pops the next pending line without waiting.
    ///
    /// Emptying the queue re-arms lag reporting.
    pub(crate) fn take(&self) -> Take {
        let mut q = self.queue.lock();
        match q.state {
            SlotState::Closed => Take::Closed,
            SlotState::Active => {
                let next = q.lines.pop_front();
                if q.lines.is_empty() {
                    q.lagging = false;
                }
                match next {
                    Some(line) => Take::Line(line),
                    None => Take::Empty,
                }
            }
            SlotState::Draining => match q.lines.pop_front() {
                Some(line) => Take::Line(line),
                None => {
                    q.state = SlotState::Closed;
                    Take::Closed
                }
            },
        }
    }

    /// Closes immediately, discarding pending lines.
    ///
    /// Returns `false` if the slot was already closed.
    pub(crate) fn close(&self) -> bool {
        let was_open = {
            let mut q = self.queue.lock();
            let was_open = q.state != SlotState::Closed;
            q.state = SlotState::Closed;
            q.lines.clear();
            was_open
        };
        self.notify.notify_one();
        was_open
    }

    /// Stops accepting lines; pending ones stay readable.
    pub(crate) fn drain(&self) {
        {
            let mut q = self.queue.lock();
            if q.state == SlotState::Active {
                q.state = SlotState::Draining;
            }
        }
        self.notify.notify_one();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.queue.lock().state == SlotState::Closed
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.queue.lock().lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(capacity: usize, overflow: OverflowPolicy) -> Slot {
        Slot::new(
            SubscriberId::from_raw(1),
            &HubConfig {
                queue_capacity: capacity,
                overflow,
            },
        )
    }

    fn drain_all(slot: &Slot) -> Vec<String> {
        let mut out = Vec::new();
        while let Take::Line(l) = slot.take() {
            out.push(l.to_string());
        }
        out
    }

    #[test]
    fn test_drop_oldest_keeps_tail() {
        let s = slot(2, OverflowPolicy::DropOldest);
        assert_eq!(s.offer("a".into()), Offer::Accepted);
        assert_eq!(s.offer("b".into()), Offer::Accepted);
        assert_eq!(s.offer("c".into()), Offer::Evicted { report: true });
        assert_eq!(s.dropped(), 1);
        assert_eq!(drain_all(&s), vec!["b", "c"]);
    }

    #[test]
    fn test_drop_newest_keeps_head() {
        let s = slot(2, OverflowPolicy::DropNewest);
        s.offer("a".into());
        s.offer("b".into());
        assert_eq!(s.offer("c".into()), Offer::Rejected { report: true });
        assert_eq!(s.dropped(), 1);
        assert_eq!(drain_all(&s), vec!["a", "b"]);
    }

    #[test]
    fn test_lag_reported_once_until_queue_empties() {
        let s = slot(2, OverflowPolicy::DropOldest);
        s.offer("a".into());
        s.offer("b".into());
        assert_eq!(s.offer("c".into()), Offer::Evicted { report: true });
        assert_eq!(s.offer("d".into()), Offer::Evicted { report: false });
        assert_eq!(s.offer("e".into()), Offer::Evicted { report: false });
        assert_eq!(s.dropped(), 3);

        // Partial read: still behind.
        assert!(matches!(s.take(), Take::Line(l) if l == "d"));
        s.offer("f".into());
        assert_eq!(s.offer("g".into()), Offer::Evicted { report: false });

        // Caught up: the next overflow is a new episode.
        assert_eq!(drain_all(&s), vec!["f", "g"]);
        s.offer("h".into());
        s.offer("i".into());
        assert_eq!(s.offer("j".into()), Offer::Evicted { report: true });
        assert_eq!(s.dropped(), 5);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let s = slot(0, OverflowPolicy::DropOldest);
        s.offer("a".into());
        s.offer("b".into());
        assert_eq!(s.pending(), 1);
        assert_eq!(drain_all(&s), vec!["b"]);
    }

    #[test]
    fn test_close_discards_and_is_absorbing() {
        let s = slot(4, OverflowPolicy::DropOldest);
        s.offer("a".into());
        assert!(s.close());
        assert!(!s.close());
        assert!(matches!(s.take(), Take::Closed));
        assert_eq!(s.offer("b".into()), Offer::Closed);
        s.drain();
        assert!(matches!(s.take(), Take::Closed));
    }

    #[test]
    fn test_drain_delivers_pending_then_closes() {
        let s = slot(4, OverflowPolicy::DropOldest);
        s.offer("a".into());
        s.drain();
        assert_eq!(s.offer("b".into()), Offer::Closed);
        assert!(matches!(s.take(), Take::Line(l) if l == "a"));
        assert!(matches!(s.take(), Take::Closed));
        assert!(s.is_closed());
    }
}
