//! # RelayDriver: the record → line control loop.
//!
//! Pulls records from a [`RecordSource`] one at a time, runs them through the
//! extractor and formatter, and publishes the resulting lines into the [`Hub`].
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► next_record()                       (cancellable wait)
//!   │     ├─ Ok(Some(record)):
//!   │     │     ├─ extract_offset ─ Err(MissingMetadata) ─► publish RecordSkipped, continue
//!   │     │     └─ Ok(offset) ─► format_line ─► hub.publish(line)
//!   │     ├─ Ok(None)  ─► publish UpstreamEnded, exit Ok(stats)
//!   │     └─ Err(e)    ─► publish UpstreamFailed
//!   │                      ├─ Fatal / RestartPolicy::Never / limit hit ─► exit Err(Upstream)
//!   │                      └─ otherwise ─► publish BackoffScheduled, sleep (cancellable)
//!   └─► cancellation ─► exit Ok(stats)
//! }
//! ```
//!
//! ## Rules
//! - Records are processed **sequentially** in the order the source returns them.
//! - Per-record failures never end the loop.
//! - The consecutive-failure counter **resets** on every successful pull.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{RelayError, SourceError},
    events::{Bus, Event, EventKind},
    hub::Hub,
    policies::{BackoffPolicy, RestartPolicy},
    record::{Record, extract_offset, format_line},
    source::RecordSource,
};

/// Upstream failure handling extracted from [`RelayConfig`](crate::RelayConfig).
#[derive(Clone, Copy, Debug, Default)]
pub struct DriverParams {
    /// Whether to pull again after a retryable failure.
    pub restart: RestartPolicy,
    /// Delay schedule between failed pulls.
    pub backoff: BackoffPolicy,
    /// Give up on this many consecutive failures (`None` = never).
    pub retry_limit: Option<u32>,
}

/// Counters reported when the driver exits cleanly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Records pulled from the source.
    pub received: u64,
    /// Lines handed to the hub.
    pub published: u64,
    /// Records discarded before formatting.
    pub skipped: u64,
}

/// Drives one record source into one hub.
pub struct RelayDriver<S> {
    source: S,
    hub: Hub,
    bus: Bus,
    params: DriverParams,
}

impl<S: RecordSource> RelayDriver<S> {
    pub fn new(source: S, hub: Hub, bus: Bus, params: DriverParams) -> Self {
        Self {
            source,
            hub,
            bus,
            params,
        }
    }

    /// Runs until the source ends, the token is cancelled, or the upstream
    /// failure policy gives up.
    ///
    /// # Errors
    /// [`RelayError::Upstream`] when a pull failure is not retried.
    pub async fn run(mut self, token: CancellationToken) -> Result<DriverStats, RelayError> {
        let mut stats = DriverStats::default();
        let mut failures: u32 = 0;

        tracing::info!(source = self.source.name(), "driver started");
        loop {
            let pulled = select! {
                biased;
                _ = token.cancelled() => break,
                res = self.source.next_record() => res,
            };

            match pulled {
                Ok(Some(record)) => {
                    failures = 0;
                    stats.received += 1;
                    self.relay_one(&record, &mut stats);
                }
                Ok(None) => {
                    tracing::info!(source = self.source.name(), "upstream ended");
                    self.bus.publish(
                        Event::new(EventKind::UpstreamEnded).with_source(self.source.name()),
                    );
                    break;
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    let Some(delay) = self.on_failure(&error, failures) else {
                        return Err(RelayError::Upstream {
                            source_name: self.source.name().to_string(),
                            attempts: failures,
                            error,
                        });
                    };

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    select! {
                        _ = &mut sleep => {}
                        _ = token.cancelled() => break,
                    }
                }
            }
        }

        tracing::info!(
            source = self.source.name(),
            received = stats.received,
            published = stats.published,
            skipped = stats.skipped,
            "driver stopped"
        );
        Ok(stats)
    }

    /// Extract → format → publish for one record.
    fn relay_one(&self, record: &Record, stats: &mut DriverStats) {
        match extract_offset(record) {
            Ok(offset) => {
                let line = format_line(offset, &record.payload);
                let delivered = self.hub.publish(line);
                stats.published += 1;
                tracing::trace!(offset, delivered, "line published");
            }
            Err(e) => {
                stats.skipped += 1;
                tracing::debug!(source = self.source.name(), reason = e.as_label(), "record skipped");
                self.bus.publish(
                    Event::new(EventKind::RecordSkipped)
                        .with_source(self.source.name())
                        .with_reason(e.as_label()),
                );
            }
        }
    }

    /// Reports a failed pull and returns the delay before the next one,
    /// or `None` if the driver must give up.
    fn on_failure(&self, error: &SourceError, failures: u32) -> Option<Duration> {
        let name = self.source.name();
        tracing::warn!(source = name, attempt = failures, error = %error, "upstream pull failed");
        self.bus.publish(
            Event::new(EventKind::UpstreamFailed)
                .with_source(name)
                .with_attempt(failures)
                .with_reason(error.to_string()),
        );

        let exhausted = self
            .params
            .retry_limit
            .is_some_and(|limit| failures >= limit);
        if !error.is_retryable() || !self.params.restart.retries() || exhausted {
            return None;
        }

        let delay = self.params.backoff.next(failures - 1);
        self.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_source(name)
                .with_attempt(failures)
                .with_delay(delay)
                .with_reason(error.to_string()),
        );
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{HubConfig, Subscription};
    use crate::policies::JitterPolicy;
    use crate::source::ChannelSource;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Replays a fixed script of pull results, then ends.
    struct Scripted(VecDeque<Result<Option<Record>, SourceError>>);

    #[async_trait]
    impl RecordSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn scripted(items: Vec<Result<Option<Record>, SourceError>>) -> Scripted {
        Scripted(items.into())
    }

    fn params(restart: RestartPolicy, retry_limit: Option<u32>) -> DriverParams {
        DriverParams {
            restart,
            backoff: BackoffPolicy {
                first: Duration::from_millis(100),
                max: Duration::from_secs(1),
                factor: 2.0,
                jitter: JitterPolicy::None,
            },
            retry_limit,
        }
    }

    fn pending(sub: &mut Subscription) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(Some(line)) = sub.try_next() {
            out.push(line.to_string());
        }
        out
    }

    #[tokio::test]
    async fn test_scenario_two_subscribers_skip_missing_offset() {
        let hub = Hub::new(HubConfig::default());
        let mut a = hub.register();
        let mut b = hub.register();

        let (source, handle) = ChannelSource::new("orders", 8);
        handle.send(Record::at(Some(10), "a")).await.expect("send");
        handle.send(Record::at(None, "b")).await.expect("send");
        handle.send(Record::at(Some(11), "c")).await.expect("send");
        drop(handle);

        let driver = RelayDriver::new(source, hub.clone(), Bus::new(16), DriverParams::default());
        let stats = driver.run(CancellationToken::new()).await.expect("clean exit");

        assert_eq!(
            stats,
            DriverStats {
                received: 3,
                published: 2,
                skipped: 1
            }
        );
        let expected = vec!["Offset=10; message=a", "Offset=11; message=c"];
        assert_eq!(pending(&mut a), expected);
        assert_eq!(pending(&mut b), expected);
    }

    #[tokio::test]
    async fn test_skip_is_reported_and_loop_continues() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let hub = Hub::new(HubConfig::default());
        let mut sub = hub.register();

        let source = scripted(vec![
            Ok(Some(Record::bare("no-meta"))),
            Ok(Some(Record::at(Some(5), "after"))),
        ]);
        let stats = RelayDriver::new(source, hub, bus, DriverParams::default())
            .run(CancellationToken::new())
            .await
            .expect("clean exit");

        assert_eq!(stats.skipped, 1);
        assert_eq!(pending(&mut sub), vec!["Offset=5; message=after"]);

        let skipped = rx.recv().await.expect("event");
        assert_eq!(skipped.kind, EventKind::RecordSkipped);
        assert_eq!(skipped.reason.as_deref(), Some("missing_metadata"));
        assert_eq!(skipped.source.as_deref(), Some("scripted"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried_with_backoff() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let hub = Hub::new(HubConfig::default());
        let mut sub = hub.register();

        let source = scripted(vec![
            Ok(Some(Record::at(Some(1), "x"))),
            Err(SourceError::fail("broker down")),
            Err(SourceError::fail("broker down")),
            Ok(Some(Record::at(Some(2), "y"))),
        ]);
        let started = time::Instant::now();
        let stats = RelayDriver::new(source, hub, bus, params(RestartPolicy::OnFailure, Some(3)))
            .run(CancellationToken::new())
            .await
            .expect("recovered");

        assert_eq!(stats.published, 2);
        assert_eq!(pending(&mut sub), vec!["Offset=1; message=x", "Offset=2; message=y"]);
        // 100ms after the first failure, 200ms after the second.
        assert!(started.elapsed() >= Duration::from_millis(300));

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::UpstreamFailed,
                EventKind::BackoffScheduled,
                EventKind::UpstreamFailed,
                EventKind::BackoffScheduled,
                EventKind::UpstreamEnded,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_limit_surfaces_upstream_error() {
        let source = scripted(vec![
            Err(SourceError::fail("one")),
            Err(SourceError::fail("two")),
            Ok(Some(Record::at(Some(1), "never"))),
        ]);
        let err = RelayDriver::new(
            source,
            Hub::new(HubConfig::default()),
            Bus::new(16),
            params(RestartPolicy::OnFailure, Some(2)),
        )
        .run(CancellationToken::new())
        .await
        .expect_err("gives up");

        match err {
            RelayError::Upstream {
                source_name,
                attempts,
                error,
            } => {
                assert_eq!(source_name, "scripted");
                assert_eq!(attempts, 2);
                assert_eq!(error, SourceError::fail("two"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_never_policy_fails_fast() {
        let source = scripted(vec![Err(SourceError::fail("down"))]);
        let err = RelayDriver::new(
            source,
            Hub::new(HubConfig::default()),
            Bus::new(16),
            params(RestartPolicy::Never, None),
        )
        .run(CancellationToken::new())
        .await
        .expect_err("fail fast");
        assert_eq!(err.as_label(), "relay_upstream_failed");
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let source = scripted(vec![Err(SourceError::fatal("topic deleted"))]);
        let err = RelayDriver::new(
            source,
            Hub::new(HubConfig::default()),
            Bus::new(16),
            params(RestartPolicy::OnFailure, None),
        )
        .run(CancellationToken::new())
        .await
        .expect_err("fatal");
        assert!(matches!(err, RelayError::Upstream { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_exits_cleanly() {
        let source = scripted(vec![Err(SourceError::fail("down"))]);
        let mut p = params(RestartPolicy::OnFailure, None);
        p.backoff.first = Duration::from_secs(3600);
        p.backoff.max = Duration::from_secs(3600);

        let token = CancellationToken::new();
        let driver = RelayDriver::new(source, Hub::new(HubConfig::default()), Bus::new(16), p);
        let run = tokio::spawn(driver.run(token.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        let stats = run.await.expect("join").expect("clean exit");
        assert_eq!(stats, DriverStats::default());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_records() {
        let (source, _handle) = ChannelSource::new("idle", 1);
        let token = CancellationToken::new();
        let driver = RelayDriver::new(
            source,
            Hub::new(HubConfig::default()),
            Bus::new(16),
            DriverParams::default(),
        );
        let run = tokio::spawn(driver.run(token.clone()));
        token.cancel();
        let stats = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("timely")
            .expect("join")
            .expect("clean exit");
        assert_eq!(stats.received, 0);
    }
}
