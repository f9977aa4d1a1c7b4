//! Exponential backoff with jitter for job retry scheduling: initial delay,
//! a cap at 10 minutes, and a maximum of 5 attempts by default.

use std::time::Duration;

use rand::Rng;

/// Governs how long a failed job waits before its next attempt, and how
/// many attempts are allowed before a retryable failure becomes terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// 30s initial delay, doubling each attempt, capped at 10 minutes,
    /// giving up after 5 attempts.
    pub const DEFAULT: Self = Self {
        initial_backoff: Duration::from_secs(30),
        multiplier: 2.0,
        max_backoff: Duration::from_secs(600),
        max_attempts: 5,
    };

    /// Computes the delay before attempt number `next_attempt` (1-indexed),
    /// with +/-25% jitter applied to the exponential growth before capping,
    /// so concurrently-failing jobs don't retry in lockstep and the cap is
    /// a true ceiling the jittered delay can never exceed.
    #[must_use]
    pub fn backoff_for(&self, next_attempt: u32) -> Duration {
        let exponent = next_attempt.saturating_sub(1);
        let raw = self.initial_backoff.as_secs_f64() * self.multiplier.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let jitter = rand::thread_rng().gen_range(0.75..1.25);
        let jittered = (raw * jitter).max(0.0);
        Duration::from_secs_f64(jittered.min(self.max_backoff.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_before_the_cap() {
        let policy = RetryPolicy::DEFAULT;
        let first = policy.backoff_for(1).as_secs_f64();
        let second = policy.backoff_for(2).as_secs_f64();
        // jitter means these aren't exact multiples, but second should
        // trend meaningfully higher across many samples; check bounds.
        assert!(first >= 30.0 * 0.75 && first <= 30.0 * 1.25);
        assert!(second >= 60.0 * 0.75 && second <= 60.0 * 1.25);
    }

    #[test]
    fn backoff_never_exceeds_the_cap() {
        let policy = RetryPolicy::DEFAULT;
        let far_future = policy.backoff_for(50).as_secs_f64();
        assert!(far_future <= 600.0, "jittered delay {far_future} exceeded the 600s cap");
    }
}
