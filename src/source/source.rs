//! # Record source abstraction.
//!
//! [`RecordSource`] is the seam between the relay and the log-consumer client.
//! Broker connections, partition assignment and commit policy all live behind
//! it; the driver only pulls records one at a time, in partition order.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use logcast::{Record, RecordSource, SourceError};
//!
//! struct Fixed(Vec<Record>);
//!
//! #[async_trait]
//! impl RecordSource for Fixed {
//!     fn name(&self) -> &str { "fixed" }
//!
//!     async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
//!         Ok(if self.0.is_empty() { None } else { Some(self.0.remove(0)) })
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::SourceError;
use crate::record::Record;

/// Pull-based stream of records from the log.
#[async_trait]
pub trait RecordSource: Send + 'static {
    /// Returns a stable, human-readable source name (for logs and events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Waits for the next record.
    ///
    /// - `Ok(Some(record))`: the next record in partition order.
    /// - `Ok(None)`: the upstream signalled shutdown; the driver stops.
    /// - `Err(_)`: the pull failed; the driver applies its restart policy.
    async fn next_record(&mut self) -> Result<Option<Record>, SourceError>;
}
