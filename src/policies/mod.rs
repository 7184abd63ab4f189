//! Upstream retry policies.
//!
//! These knobs control **if** the driver pulls again after the record source
//! fails and **how long** it waits first.
//!
//! ## Contents
//! - [`RestartPolicy`] fail fast or retry
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization strategy to avoid synchronized reconnects
//!
//! ## Quick wiring
//! ```text
//! RelayConfig { restart, backoff, max_retries }
//!      └─► core::driver::RelayDriver uses:
//!           - restart to decide retry/exit
//!           - backoff.next(failures - 1) to schedule the next pull
//! ```

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::RestartPolicy;
