//! Retry policy for send outcomes.
//!
//! Only explicit back-off requests from the messaging API are retried. Unknown
//! errors are counted as a single failure and the unit is dropped.

use std::time::Duration;

use crate::types::Outcome;

/// Longest back-off honoured for a single retry; longer requests are clamped
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// What happens to a unit after one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Counted as sent
    Delivered,
    /// Deferred for `after`, then sent again
    Retry { after: Duration },
    /// Rate limited too many times; counted as failed
    Exhausted,
    /// Recipient is unreachable; counted as failed and reported as blocked
    Blocked,
    /// Any other error; counted as failed, not retried
    Failed { detail: String },
}

/// Bounds how many rate-limited attempts a single recipient may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of send attempts per recipient
    pub max_attempts: u32,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Check whether a unit that has been rate limited `attempts` times may be
    /// sent again.
    #[must_use]
    pub const fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Decide the fate of a unit after a send attempt.
    ///
    /// `attempts` is the number of rate-limited attempts recorded before this
    /// one. Back-offs above [`MAX_RETRY_AFTER`] are clamped to it.
    #[must_use]
    pub fn disposition(&self, attempts: u32, outcome: Outcome) -> Disposition {
        match outcome {
            Outcome::Success => Disposition::Delivered,
            Outcome::RateLimited { retry_after } => {
                if self.should_retry(attempts.saturating_add(1)) {
                    Disposition::Retry {
                        after: retry_after.min(MAX_RETRY_AFTER),
                    }
                } else {
                    Disposition::Exhausted
                }
            }
            Outcome::RecipientUnreachable => Disposition::Blocked,
            Outcome::TransientError { detail } => Disposition::Failed { detail },
        }
    }
}
