//! Runtime core: the relay loop and its lifecycle.
//!
//! Public API from this module is [`Relay`] (plus its builder and config)
//! and the lower-level [`RelayDriver`] for callers that manage their own
//! shutdown.
//!
//! Internal modules:
//! - [`driver`]: pulls records, extracts, formats and publishes lines;
//! - [`relay`]: owns hub/bus/observers, spawns the driver, handles shutdown;
//! - [`shutdown`]: cross-platform termination signal handling;
//! - [`config`]: runtime settings.

mod builder;
mod config;
mod driver;
mod relay;
mod shutdown;

pub use builder::RelayBuilder;
pub use config::RelayConfig;
pub use driver::{DriverParams, DriverStats, RelayDriver};
pub use relay::Relay;
