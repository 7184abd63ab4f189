//! # logcast
//!
//! **Logcast** relays records from a partitioned, append-only log to many
//! long-lived streaming clients.
//!
//! One upstream consumer pulls records, tags each with its partition offset,
//! renders it as a line of text and fans that line out to every connected
//! subscriber. Subscribers can join and leave at any time; a slow or idle
//! subscriber never holds back the others.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        ┌──────────────────────────┐
//!        │  RecordSource            │
//!        │  (log consumer adapter)  │
//!        └────────────┬─────────────┘
//!                     ▼  next_record()
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Relay (runtime owner)                                            │
//! │  - RelayDriver: extract_offset ─► format_line ─► Hub::publish     │
//! │  - Bus (broadcast runtime events)                                 │
//! │  - ObserverSet (fans out events to user observers)                │
//! └──────┬────────────────────────────────────────────────────┬───────┘
//!        ▼                                                    │
//! ┌───────────────────────────────────────────────────┐       │
//! │  Hub (subscriber registry)                        │       │
//! │  publish(line): push into every live queue,       │       │
//! │  never waits for a consumer                       │       │
//! └──────┬──────────────────┬──────────────────┬──────┘       │
//!        ▼                  ▼                  ▼              │
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐        │
//!   │ queue #1 │       │ queue #2 │       │ queue #N │        │
//!   │ (cap C)  │       │ (cap C)  │       │ (cap C)  │        │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘        │
//!        ▼                  ▼                  ▼              ▼
//!   Subscription       Subscription       Subscription   Bus ─► observers
//!   (SSE client)       (SSE client)       (custom sink)   (LogWriter, ...)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Relay::run(source)
//!   ├─► driver loop (see core::driver)
//!   ├─► on SIGINT/SIGTERM: ShutdownRequested ─► cancel driver ─► wait grace
//!   └─► Hub::close(): every subscription drains its queue, then ends
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Records**       | Inbound records, offset extraction and line template.        | [`Record`], [`extract_offset`], [`Line`]  |
//! | **Fan-out**       | Bounded per-subscriber queues with an overflow policy.       | [`Hub`], [`Subscription`]                 |
//! | **Runtime**       | Driver loop, upstream retries, graceful shutdown.            | [`Relay`], [`RelayDriver`]                |
//! | **Sources**       | Plug in a log consumer.                                      | [`RecordSource`], [`ChannelSource`]       |
//! | **Observer API**  | Hook into runtime events (logging, metrics, custom).         | [`Observe`]                               |
//! | **Policies**      | Configure restart/backoff for upstream failures.             | [`RestartPolicy`], [`BackoffPolicy`]      |
//! | **Errors**        | Typed errors for the runtime, sources and extraction.        | [`RelayError`], [`SourceError`]           |
//! | **Configuration** | Centralize runtime settings.                                 | [`RelayConfig`]                           |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] observer.
//! - `sse`: exposes the `sse` module, a Server-Sent-Events transport over hyper.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use logcast::{ChannelSource, Record, Relay, RelayConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let observers: Vec<Arc<dyn logcast::Observe>> = vec![Arc::new(logcast::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let observers: Vec<Arc<dyn logcast::Observe>> = Vec::new();
//!
//!     let relay = Relay::builder(RelayConfig::default())
//!         .with_observers(observers)
//!         .build();
//!
//!     // Transports register subscribers through a hub handle.
//!     let hub = relay.hub();
//!     let mut client = hub.register();
//!
//!     let (source, upstream) = ChannelSource::new("orders", 16);
//!     upstream.send(Record::at(Some(41), "created")).await.ok();
//!     upstream.send(Record::at(Some(42), "paid")).await.ok();
//!     drop(upstream);
//!
//!     relay.run_until(source, CancellationToken::new()).await?;
//!
//!     assert_eq!(client.next().await.as_deref(), Some("Offset=41; message=created"));
//!     assert_eq!(client.next().await.as_deref(), Some("Offset=42; message=paid"));
//!     assert_eq!(client.next().await, None);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod hub;
mod observers;
mod policies;
mod record;
mod source;

// ---- Public re-exports ----

pub use core::{DriverParams, DriverStats, Relay, RelayBuilder, RelayConfig, RelayDriver};
pub use error::{ExtractError, RelayError, SourceError};
pub use events::{Bus, Event, EventKind};
pub use hub::{CloseReason, Hub, HubConfig, OverflowPolicy, SubscriberId, Subscription};
pub use observers::{Observe, ObserverSet};
pub use policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
pub use record::{Line, Record, RecordMetadata, extract_offset, format_line};
pub use source::{ChannelSource, ChannelSourceHandle, RecordSource};

// Optional: built-in observer that forwards events to `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;

// Optional: Server-Sent-Events transport.
// Enable with: `--features sse`
#[cfg(feature = "sse")]
pub mod sse;
