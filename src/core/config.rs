//! # Relay runtime configuration.
//!
//! Provides [`RelayConfig`], the centralized settings for one relay.
//!
//! ## Sentinel values
//! - `max_retries = 0` → unlimited retries (while `restart` allows them)
//! - `queue_capacity = 0`, `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::hub::{HubConfig, OverflowPolicy};
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Configuration for the relay runtime.
///
/// ## Field semantics
/// - `queue_capacity`: pending lines per subscriber (min 1)
/// - `overflow`: what a full subscriber queue does with a new line
/// - `bus_capacity`: runtime event bus ring buffer size (min 1)
/// - `grace`: how long shutdown waits for the driver
/// - `restart`, `backoff`, `max_retries`: upstream failure handling
///
/// All fields are public; prefer the helper accessors over checking sentinels
/// by hand.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Maximum number of undelivered lines held for one subscriber.
    pub queue_capacity: usize,

    /// Overflow policy applied per subscriber.
    pub overflow: OverflowPolicy,

    /// Capacity of the runtime event bus.
    ///
    /// Only observability events travel on the bus; lines never do.
    pub bus_capacity: usize,

    /// Maximum time to wait for the driver after a shutdown signal.
    ///
    /// When exceeded the driver is aborted and `RelayError::GraceExceeded`
    /// is returned.
    pub grace: Duration,

    /// Whether to pull again after a retryable upstream failure.
    pub restart: RestartPolicy,

    /// Delay schedule between consecutive failed pulls.
    pub backoff: BackoffPolicy,

    /// Re-pulls attempted after consecutive failures before giving up.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = up to `n` retries; failure number `n + 1` ends the relay
    pub max_retries: u32,
}

impl RelayConfig {
    /// Returns the per-subscriber settings for the hub.
    #[inline]
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.queue_capacity.max(1),
            overflow: self.overflow,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the consecutive-failure count that ends the relay.
    ///
    /// - `None` → unlimited
    /// - `Some(max_retries + 1)` → the first failure plus `max_retries` retries
    #[inline]
    pub fn retry_limit(&self) -> Option<u32> {
        if self.max_retries == 0 {
            None
        } else {
            Some(self.max_retries.saturating_add(1))
        }
    }
}

impl Default for RelayConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 64`, `overflow = DropOldest`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    /// - `restart = OnFailure`, `backoff = BackoffPolicy::default()`, `max_retries = 0`
    fn default() -> Self {
        let hub = HubConfig::default();
        Self {
            queue_capacity: hub.queue_capacity,
            overflow: hub.overflow,
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
            restart: RestartPolicy::default(),
            backoff: BackoffPolicy::default(),
            max_retries: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let mut cfg = RelayConfig::default();
        assert_eq!(cfg.retry_limit(), None);
        assert_eq!(cfg.hub_config().queue_capacity, 64);

        cfg.max_retries = 3;
        cfg.queue_capacity = 0;
        cfg.bus_capacity = 0;
        assert_eq!(cfg.retry_limit(), Some(4));
        assert_eq!(cfg.hub_config().queue_capacity, 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn test_one_retry_allows_two_failures() {
        let mut cfg = RelayConfig::default();
        cfg.max_retries = 1;
        assert_eq!(cfg.retry_limit(), Some(2));

        cfg.max_retries = u32::MAX;
        assert_eq!(cfg.retry_limit(), Some(u32::MAX));
    }
}
