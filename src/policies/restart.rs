//! # Restart policy for the record source.
//!
//! [`RestartPolicy`] decides what the driver does when the source fails to
//! deliver the next record.
//!
//! ```text
//! RestartPolicy::Never       → first failure ends the relay (fail fast)
//! RestartPolicy::OnFailure   → wait per BackoffPolicy, pull again (default)
//! ```
//!
//! A [`SourceError::Fatal`](crate::SourceError::Fatal) is never retried,
//! whatever the policy says.

/// Policy controlling whether the driver pulls again after an upstream failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never retry: surface the failure immediately.
    Never,
    /// Retry with backoff (default).
    #[default]
    OnFailure,
}

impl RestartPolicy {
    /// True if this policy allows another pull after a retryable failure.
    #[inline]
    pub fn retries(&self) -> bool {
        matches!(self, RestartPolicy::OnFailure)
    }
}
