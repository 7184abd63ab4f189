use std::sync::Arc;

use super::{config::RelayConfig, relay::Relay};
use crate::observers::Observe;

/// Builder for constructing a [`Relay`] with optional observers.
pub struct RelayBuilder {
    cfg: RelayConfig,
    observers: Vec<Arc<dyn Observe>>,
}

impl RelayBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RelayConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Replaces the observer list.
    ///
    /// Observers receive runtime events (subscriber lifecycle, upstream
    /// failures, shutdown) through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds one observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the relay: event bus, hub and observer workers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Relay {
        Relay::new(self.cfg, self.observers)
    }
}
