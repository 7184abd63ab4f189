//! Error types used by the logcast runtime, record sources and the extractor.
//!
//! This module defines three enums:
//!
//! - [`RelayError`] errors that end a relay run (returned from `Relay::run`).
//! - [`SourceError`] errors raised by a [`RecordSource`](crate::RecordSource).
//! - [`ExtractError`] per-record failures of the offset extractor.
//!
//! All of them provide `as_label` for logs/metrics. Only [`RelayError`] ever
//! reaches the process boundary: extraction and subscriber failures are
//! contained inside the relay.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the relay runtime.
///
/// These are the only failures that escape the relay: the upstream is gone
/// for good, or shutdown could not finish in time.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// The record source failed and the restart policy gave up on it.
    #[error("upstream '{source_name}' failed after {attempts} attempt(s): {error}")]
    Upstream {
        /// Name of the record source.
        source_name: String,
        /// Consecutive failed pulls before giving up.
        attempts: u32,
        /// The last error reported by the source.
        error: SourceError,
    },

    /// Shutdown grace period was exceeded; the driver had to be aborted.
    #[error("shutdown timeout {grace:?} exceeded; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// The driver task ended without returning a result (panicked or was aborted).
    #[error("relay driver died: {reason}")]
    DriverDied {
        /// Short description of how the task ended.
        reason: String,
    },
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use logcast::RelayError;
    /// use std::time::Duration;
    ///
    /// let err = RelayError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "relay_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::Upstream { .. } => "relay_upstream_failed",
            RelayError::GraceExceeded { .. } => "relay_grace_exceeded",
            RelayError::DriverDied { .. } => "relay_driver_died",
        }
    }
}

/// # Errors produced by record sources.
///
/// A source reports a broken connection as [`SourceError::Fail`] (the driver
/// may retry per its policy) or an unrecoverable condition as
/// [`SourceError::Fatal`] (never retried).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Pull failed but may succeed if retried.
    #[error("pull failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error (should not be retried).
    #[error("fatal source error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl SourceError {
    /// Shorthand for [`SourceError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        SourceError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`SourceError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        SourceError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SourceError::Fail { .. } => "source_failed",
            SourceError::Fatal { .. } => "source_fatal",
        }
    }

    /// Indicates whether the driver may retry after this error.
    ///
    /// # Example
    /// ```
    /// use logcast::SourceError;
    ///
    /// assert!(SourceError::fail("broker unreachable").is_retryable());
    /// assert!(!SourceError::fatal("topic deleted").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Fail { .. })
    }
}

/// # Per-record extraction failures.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// The record carries no partition-position metadata.
    #[error("record has no partition metadata")]
    MissingMetadata,
}

impl ExtractError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExtractError::MissingMetadata => "missing_metadata",
        }
    }
}
