//! # Relay: owns the hub, runs the driver, handles shutdown.
//!
//! The [`Relay`] owns the event bus, the [`Hub`], the [`ObserverSet`] and the
//! runtime configuration. Transports get a [`Hub`] clone before the relay runs.
//!
//! ## Key responsibilities
//! - forward bus events to observers (fire-and-forget)
//! - spawn the [`RelayDriver`] over the given [`RecordSource`]
//! - stop on OS termination signals (or a caller token) with a grace period
//! - close the hub on exit so every subscriber drains and ends
//!
//! ## High-level architecture
//! ```text
//! Relay::run(source)
//!   ├─► observer_listener(): Bus.subscribe() ─► ObserverSet::emit(&Event)
//!   ├─► spawn RelayDriver::run(driver_token)
//!   │        source ─► extract ─► format ─► Hub.publish ─► [sub 1] [sub 2] ... [sub N]
//!   └─► select:
//!         ├─ driver finished      → its result
//!         └─ shutdown signal      → Bus.publish(ShutdownRequested)
//!                                   driver_token.cancel()
//!                                   wait up to cfg.grace:
//!                                     ├─ Ok       → Bus.publish(AllStoppedWithin)
//!                                     └─ timeout  → abort, Bus.publish(GraceExceeded)
//!   finally: Hub.close() → HubClosed, observers flushed
//! ```
//!
//! ## Example
//! ```rust
//! use logcast::{ChannelSource, Record, Relay, RelayConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = Relay::builder(RelayConfig::default()).build();
//!     let mut client = relay.hub().register();
//!
//!     let (source, handle) = ChannelSource::new("orders", 16);
//!     handle.send(Record::at(Some(7), "hello")).await.ok();
//!     drop(handle);
//!
//!     let stats = relay.run_until(source, CancellationToken::new()).await?;
//!     assert_eq!(stats.published, 1);
//!     assert_eq!(client.next().await.as_deref(), Some("Offset=7; message=hello"));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::builder::RelayBuilder;
use super::config::RelayConfig;
use super::driver::{DriverParams, DriverStats, RelayDriver};
use super::shutdown;
use crate::error::RelayError;
use crate::events::{Bus, Event, EventKind};
use crate::hub::Hub;
use crate::observers::{Observe, ObserverSet};
use crate::source::RecordSource;

type DriverHandle = JoinHandle<Result<DriverStats, RelayError>>;

/// Runtime owner of one hub and its driver.
pub struct Relay {
    cfg: RelayConfig,
    bus: Bus,
    hub: Hub,
    observers: ObserverSet,
    events: broadcast::Receiver<Event>,
}

impl Relay {
    /// Starts building a relay.
    pub fn builder(cfg: RelayConfig) -> RelayBuilder {
        RelayBuilder::new(cfg)
    }

    /// Creates a relay with the given observers.
    ///
    /// Must be called from within a tokio runtime (observer workers are spawned here).
    pub fn new(cfg: RelayConfig, observers: Vec<Arc<dyn Observe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        // Subscribed before anything can publish, so early events reach observers.
        let events = bus.subscribe();
        let hub = Hub::with_bus(cfg.hub_config(), bus.clone());
        let observers = ObserverSet::new(observers, bus.clone());
        Self {
            cfg,
            bus,
            hub,
            observers,
            events,
        }
    }

    /// Returns a handle to the hub, for transports to register subscribers.
    pub fn hub(&self) -> Hub {
        self.hub.clone()
    }

    /// Returns the runtime event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.cfg
    }

    /// Runs until the source ends, the upstream fails for good, or the
    /// process receives a termination signal.
    ///
    /// # Errors
    /// - [`RelayError::Upstream`] when the upstream failure policy gives up
    /// - [`RelayError::GraceExceeded`] when shutdown takes longer than `grace`
    pub async fn run<S: RecordSource>(self, source: S) -> Result<DriverStats, RelayError> {
        let stop = async {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "termination signal received"),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for termination signals");
                    std::future::pending::<()>().await;
                }
            }
        };
        self.run_with(source, stop).await
    }

    /// Same as [`run`](Self::run), but stops when `token` is cancelled
    /// instead of on OS signals.
    pub async fn run_until<S: RecordSource>(
        self,
        source: S,
        token: CancellationToken,
    ) -> Result<DriverStats, RelayError> {
        self.run_with(source, token.cancelled_owned()).await
    }

    async fn run_with<S, F>(self, source: S, stop: F) -> Result<DriverStats, RelayError>
    where
        S: RecordSource,
        F: Future<Output = ()>,
    {
        let Relay {
            cfg,
            bus,
            hub,
            observers,
            events,
        } = self;

        let listener_token = CancellationToken::new();
        let listener = observer_listener(events, observers, listener_token.clone());

        let params = DriverParams {
            restart: cfg.restart,
            backoff: cfg.backoff,
            retry_limit: cfg.retry_limit(),
        };
        let driver_token = CancellationToken::new();
        let driver = RelayDriver::new(source, hub.clone(), bus.clone(), params);
        let mut handle: DriverHandle = tokio::spawn(driver.run(driver_token.clone()));

        let res = tokio::select! {
            joined = &mut handle => flatten(joined),
            _ = stop => {
                bus.publish(Event::new(EventKind::ShutdownRequested));
                driver_token.cancel();
                wait_with_grace(&cfg, &bus, &mut handle).await
            }
        };

        if let Err(e) = &res {
            tracing::warn!(label = e.as_label(), error = %e, "relay stopped with error");
        }

        hub.close();
        listener_token.cancel();
        let _ = listener.await;
        res
    }
}

/// Waits for the driver within the grace period, aborting it on timeout.
async fn wait_with_grace(
    cfg: &RelayConfig,
    bus: &Bus,
    handle: &mut DriverHandle,
) -> Result<DriverStats, RelayError> {
    let grace = cfg.grace;
    match tokio::time::timeout(grace, &mut *handle).await {
        Ok(joined) => {
            bus.publish(Event::new(EventKind::AllStoppedWithin));
            flatten(joined)
        }
        Err(_elapsed) => {
            handle.abort();
            bus.publish(Event::new(EventKind::GraceExceeded));
            Err(RelayError::GraceExceeded { grace })
        }
    }
}

fn flatten(joined: Result<Result<DriverStats, RelayError>, JoinError>) -> Result<DriverStats, RelayError> {
    match joined {
        Ok(res) => res,
        Err(je) if je.is_panic() => {
            tracing::error!("driver panicked");
            Err(RelayError::DriverDied {
                reason: "driver_panic".to_string(),
            })
        }
        Err(_cancelled) => Err(RelayError::DriverDied {
            reason: "driver_cancelled".to_string(),
        }),
    }
}

/// Forwards bus events to observers until `token` fires, then flushes them.
fn observer_listener(
    mut rx: broadcast::Receiver<Event>,
    set: ObserverSet,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "observer listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::record::Record;
    use crate::source::ChannelSource;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    /// Panics on the first pull.
    struct Exploding;

    #[async_trait]
    impl RecordSource for Exploding {
        async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
            panic!("source exploded");
        }
    }

    #[tokio::test]
    async fn test_runs_to_end_of_stream_and_closes_hub() {
        let recorder = Arc::new(Recorder::default());
        let relay = Relay::builder(RelayConfig::default())
            .with_observer(recorder.clone())
            .build();
        let hub = relay.hub();
        let mut sub = hub.register();

        let (source, handle) = ChannelSource::new("orders", 8);
        handle.send(Record::at(Some(1), "one")).await.expect("send");
        handle.send(Record::bare("skip")).await.expect("send");
        drop(handle);

        let stats = relay
            .run_until(source, CancellationToken::new())
            .await
            .expect("clean");
        assert_eq!(stats.published, 1);
        assert_eq!(stats.skipped, 1);

        assert_eq!(sub.next().await.as_deref(), Some("Offset=1; message=one"));
        assert_eq!(sub.next().await, None);
        assert!(hub.is_closed());

        let kinds = recorder.kinds.lock().clone();
        assert_eq!(kinds.first(), Some(&EventKind::SubscriberRegistered));
        assert!(kinds.contains(&EventKind::RecordSkipped));
        assert!(kinds.contains(&EventKind::UpstreamEnded));
        assert_eq!(kinds.last(), Some(&EventKind::HubClosed));
    }

    #[tokio::test]
    async fn test_stop_token_shuts_down_within_grace() {
        let recorder = Arc::new(Recorder::default());
        let relay = Relay::builder(RelayConfig::default())
            .with_observer(recorder.clone())
            .build();
        let (source, _handle) = ChannelSource::new("idle", 1);

        let token = CancellationToken::new();
        let run = tokio::spawn(relay.run_until(source, token.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let stats = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("timely")
            .expect("join")
            .expect("clean");
        assert_eq!(stats.received, 0);

        let kinds = recorder.kinds.lock().clone();
        assert!(kinds.contains(&EventKind::ShutdownRequested));
        assert!(kinds.contains(&EventKind::AllStoppedWithin));
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_aborts_driver() {
        let mut cfg = RelayConfig::default();
        cfg.grace = Duration::from_millis(50);
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        let mut handle: DriverHandle = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok(DriverStats::default())
        });
        let err = wait_with_grace(&cfg, &bus, &mut handle)
            .await
            .expect_err("too slow");
        assert!(matches!(err, RelayError::GraceExceeded { grace } if grace == cfg.grace));
        assert_eq!(rx.recv().await.expect("event").kind, EventKind::GraceExceeded);

        let joined = handle.await.expect_err("aborted");
        assert!(joined.is_cancelled());
    }

    #[tokio::test]
    async fn test_driver_panic_is_reported_and_hub_closed() {
        let relay = Relay::builder(RelayConfig::default()).build();
        let hub = relay.hub();
        let mut sub = hub.register();

        let err = relay
            .run_until(Exploding, CancellationToken::new())
            .await
            .expect_err("panicked");
        assert_eq!(err.as_label(), "relay_driver_died");
        assert_eq!(sub.next().await, None);
        assert!(hub.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_propagates() {
        let mut cfg = RelayConfig::default();
        cfg.max_retries = 1;
        let relay = Relay::builder(cfg).build();
        let hub = relay.hub();
        let mut sub = hub.register();

        let (source, handle) = ChannelSource::new("flaky", 4);
        handle.fail(SourceError::fail("down")).await;
        handle.fail(SourceError::fail("still down")).await;

        let err = relay
            .run_until(source, CancellationToken::new())
            .await
            .expect_err("gives up");
        assert!(matches!(err, RelayError::Upstream { attempts: 2, .. }));
        assert_eq!(sub.next().await, None);
    }
}
