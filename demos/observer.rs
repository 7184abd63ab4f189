//! # Custom Observer Example
//!
//! Shows how to implement a custom observer that counts relay activity.
//!
//! The example counts:
//! - Subscribers joined
//! - Records skipped (no partition metadata)
//! - Upstream failures
//!
//! ## Run
//! ```bash
//! cargo run --example observer
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use logcast::{BackoffPolicy, ChannelSource, Event, EventKind, Observe, Record, Relay, RelayConfig, SourceError};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct MetricsObserver {
    joined: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
}

impl MetricsObserver {
    fn print_stats(&self) {
        println!();
        println!("Metrics:");
        println!(" ├─► Joined:   {}", self.joined.load(Ordering::Relaxed));
        println!(" ├─► Skipped:  {}", self.skipped.load(Ordering::Relaxed));
        println!(" └─► Failures: {}", self.failures.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Observe for MetricsObserver {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::SubscriberRegistered => {
                self.joined.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::RecordSkipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::UpstreamFailed => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
    fn name(&self) -> &'static str {
        "metrics"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(MetricsObserver::default());

    let mut cfg = RelayConfig::default();
    cfg.backoff = BackoffPolicy {
        first: Duration::from_millis(50),
        ..BackoffPolicy::default()
    };

    let relay = Relay::builder(cfg).with_observer(metrics.clone()).build();
    let hub = relay.hub();

    let mut clients: Vec<_> = (0..2).map(|_| hub.register()).collect();

    let (source, upstream) = ChannelSource::new("demo", 16);
    tokio::spawn(async move {
        upstream.send(Record::at(Some(1), "first")).await.ok();
        upstream.send(Record::bare("no metadata")).await.ok();
        upstream.fail(SourceError::fail("broker hiccup")).await;
        upstream.send(Record::at(Some(2), "second")).await.ok();
    });

    let stats = relay.run_until(source, CancellationToken::new()).await?;
    println!("driver: {stats:?}");

    for (i, client) in clients.iter_mut().enumerate() {
        while let Some(line) = client.next().await {
            println!("client {i}: {line}");
        }
    }

    metrics.print_stats();
    Ok(())
}
