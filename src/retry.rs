//! Retry policy for workflow attempts.
//!
//! A failed attempt resumes from the last completed checkpoint, so retrying
//! is cheap; the policy bounds how many times the engine tries and how long
//! it waits between attempts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded exponential-backoff retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    max_attempts: u32,
    /// Delay before the second attempt.
    initial_delay: Duration,
    /// Ceiling for the delay between attempts.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt count and delay bounds.
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// A policy that runs a single attempt with no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Returns the total number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay to sleep after the given failed attempt (1-based).
    ///
    /// Doubles per attempt, capped at the configured maximum.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay.saturating_mul(1 << doublings);
        delay.min(self.max_delay)
    }
}
