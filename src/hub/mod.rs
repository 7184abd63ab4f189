//! Broadcast hub and subscriptions.
//!
//! ## Contents
//! - [`Hub`] the fan-out engine holding the subscriber registry
//! - [`Subscription`], [`SubscriberId`], [`CloseReason`] a client's ordered, lazy view of published lines
//! - [`HubConfig`], [`OverflowPolicy`] per-subscriber queue capacity and overflow behaviour
//!
//! ## Guarantees
//! - Each subscriber sees a (possibly gappy, never reordered) subsequence of
//!   the global publish order, starting at its join point.
//! - No cross-subscriber ordering is promised beyond that.

mod config;
#[allow(clippy::module_inception)]
mod hub;
mod slot;
mod subscription;

pub use config::{HubConfig, OverflowPolicy};
pub use hub::Hub;
pub use subscription::{CloseReason, SubscriberId, Subscription};
