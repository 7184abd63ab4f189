//! # Core observer trait
//!
//! `Observe` is the extension point for plugging custom event handlers into the
//! relay (metrics, alerting, audit). Each observer is driven by a dedicated
//! worker loop fed by a bounded queue owned by the
//! [`ObserverSet`](crate::observers::ObserverSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries); they do **not** block
//!   the driver, the hub, nor other observers.
//! - Each observer **declares** its preferred queue capacity via
//!   [`Observe::queue_capacity`]. If a queue overflows, events for that
//!   observer are **dropped** and an `ObserverOverflow` event is published.
//!
//! ## Example (skeleton)
//! ```rust
//! use logcast::{Event, EventKind, Observe};
//!
//! struct SkipCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Observe for SkipCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::RecordSkipped {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "skip-counter" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for runtime event observers.
///
/// Called from an observer-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handle a single event for this observer.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
