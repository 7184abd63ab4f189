//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish runtime events emitted by the relay, the driver, the hub and
//! observer workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Relay`, `RelayDriver`, `Hub` (subscriber lifecycle/lag),
//!   `ObserverSet` workers (overflow/panic).
//! - **Consumers**: `Relay::observer_listener()` (fans out to `ObserverSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
