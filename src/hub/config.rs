//! # Hub configuration and overflow policy.
//!
//! [`HubConfig`] sets the per-subscriber queue capacity and what happens when
//! that queue is full ([`OverflowPolicy`]). Both apply to every subscriber of a
//! hub; the decision is taken per subscriber, so one slow client never stalls
//! the producer or the other clients.

/// What a subscriber's queue does when a line arrives and it is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest pending line, then append the new one (ring buffer).
    ///
    /// The subscriber always holds the most recent `capacity` lines.
    #[default]
    DropOldest,

    /// Discard the incoming line for this subscriber.
    ///
    /// The subscriber keeps the lines it already had and misses newer ones
    /// until it catches up.
    DropNewest,
}

impl OverflowPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::DropOldest => "drop_oldest",
            OverflowPolicy::DropNewest => "drop_newest",
        }
    }
}

/// Per-subscriber delivery settings.
///
/// ## Field semantics
/// - `queue_capacity`: pending lines held per subscriber (min 1; clamped)
/// - `overflow`: policy applied when a subscriber's queue is full
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HubConfig {
    /// Maximum number of undelivered lines held for one subscriber.
    pub queue_capacity: usize,
    /// Overflow policy applied per subscriber.
    pub overflow: OverflowPolicy,
}

impl HubConfig {
    /// Returns the queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for HubConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 64`
    /// - `overflow = OverflowPolicy::DropOldest`
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            overflow: OverflowPolicy::DropOldest,
        }
    }
}
