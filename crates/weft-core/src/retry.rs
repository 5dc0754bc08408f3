//! Retry pacing for transient step failures.
//!
//! A step's retry budget lives on the step (`max_retries`); the policy
//! only decides how long to wait between attempts. Retries apply to
//! capability errors and timeouts - never to validation failures or
//! skipped steps.

use std::time::Duration;

/// Exponential backoff between retry attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    initial_interval: Duration,
    backoff_factor: u32,
    max_interval: Duration,
}

impl RetryPolicy {
    /// Create a policy with the default pacing: 500ms doubling up to 30s.
    pub fn new() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            backoff_factor: 2,
            max_interval: Duration::from_secs(30),
        }
    }

    /// Set the delay before the first retry.
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the multiplier applied per attempt.
    pub fn with_backoff_factor(mut self, factor: u32) -> Self {
        self.backoff_factor = factor.max(1);
        self
    }

    /// Cap the delay between attempts.
    pub fn with_max_interval(mut self, max: Duration) -> Self {
        self.max_interval = max;
        self
    }

    /// Delay before the given retry attempt (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        // factor^attempt saturates well before the cap applies
        let factor = self.backoff_factor.saturating_pow(attempt.min(16));
        (self.initial_interval * factor).min(self.max_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
