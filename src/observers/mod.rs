//! # Runtime event observers.
//!
//! This module provides the [`Observe`] trait, the [`ObserverSet`] fan-out and
//! built-in implementations for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Driver / Hub / Relay ── publish(Event) ──► Bus ──► Relay listener
//!                                                          │
//!                                                          ▼
//!                                                     ObserverSet
//!                                                ┌─────────┼─────────┐
//!                                                ▼         ▼         ▼
//!                                            LogWriter  Metrics   Custom
//! ```
//!
//! Observers never see broadcast lines; those go to hub subscribers.

#[cfg(feature = "logging")]
mod log;
mod observe;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;
