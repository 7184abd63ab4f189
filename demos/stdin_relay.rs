//! # Stdin → SSE relay
//!
//! Reads lines from stdin as records (offsets assigned in arrival order) and
//! broadcasts them to every client of `GET /stream`.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example stdin_relay --features sse
//! curl -N http://127.0.0.1:8080/stream
//! ```
//!
//! A line starting with `!` is relayed without metadata, so it gets skipped.

use std::sync::Arc;

use logcast::sse::{self, SseConfig};
use logcast::{ChannelSource, LogWriter, Observe, Record, Relay, RelayConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("LOGCAST_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter::default())];
    let relay = Relay::builder(RelayConfig::default())
        .with_observers(observers)
        .build();

    let listener = TcpListener::bind(&addr).await?;
    let transport_token = CancellationToken::new();
    let transport = tokio::spawn(sse::serve(
        listener,
        relay.hub(),
        SseConfig::default(),
        transport_token.clone(),
    ));

    let (source, upstream) = ChannelSource::new("stdin", 64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut offset: i64 = 0;
        while let Ok(Some(text)) = lines.next_line().await {
            let record = match text.strip_prefix('!') {
                Some(rest) => Record::bare(rest),
                None => {
                    offset += 1;
                    Record::at(Some(offset), text)
                }
            };
            if upstream.send(record).await.is_err() {
                break;
            }
        }
    });

    // Ends on EOF or Ctrl-C; either way the hub closes and clients drain.
    let stats = relay.run(source).await?;
    tracing::info!(?stats, "relay finished");

    transport_token.cancel();
    transport.await??;
    Ok(())
}
