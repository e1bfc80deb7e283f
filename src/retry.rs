//! Retry budget and delays between logical attempts.
//!
//! A [`RetryPolicy`] says how many times a failed request is replayed and how long
//! to wait before each replay. Which failures are replayed is decided by
//! [`Error::is_retryable`](crate::Error::is_retryable).

use rand::Rng;
use std::time::Duration;

/// Default wait before a replay.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// How the wait grows from one replay to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Backoff {
    /// Every replay waits the base delay.
    #[default]
    Fixed,

    /// Each replay waits `delay * 2^(retry - 1)`, capped at `max_delay`.
    ///
    /// With `jitter` the wait is scaled by a random factor between 50% and 100%.
    Exponential {
        /// The maximum delay between replays.
        max_delay: Duration,
        /// Whether to add random jitter to delays.
        jitter: bool,
    },
}

/// The retry configuration of a request.
///
/// # Examples
///
/// ```
/// use restpipe::retry::RetryPolicy;
/// use std::time::Duration;
///
/// // 3 replays, 250ms apart
/// let fixed = RetryPolicy::fixed(3, Duration::from_millis(250));
/// assert_eq!(fixed.delay_for_retry(3), Duration::from_millis(250));
///
/// // 100ms, 200ms, 400ms... capped at 2s
/// let exponential = RetryPolicy::exponential(
///     5,
///     Duration::from_millis(100),
///     Duration::from_secs(2),
///     false,
/// );
/// assert_eq!(exponential.delay_for_retry(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of replays after the first attempt.
    pub retries: usize,

    /// Base delay before a replay.
    pub delay: Duration,

    /// Growth of the delay across replays.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            delay: DEFAULT_RETRY_DELAY,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// A policy that never replays.
    pub fn none() -> Self {
        Self::default()
    }

    /// Replays up to `retries` times, waiting `delay` before each.
    pub fn fixed(retries: usize, delay: Duration) -> Self {
        Self {
            retries,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Replays up to `retries` times with exponentially growing delays.
    pub fn exponential(
        retries: usize,
        initial_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Self {
        Self {
            retries,
            delay: initial_delay,
            backoff: Backoff::Exponential { max_delay, jitter },
        }
    }

    /// Returns the wait before the given replay.
    ///
    /// # Arguments
    ///
    /// * `retry` - The replay number (1-indexed, so 1 = first replay)
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay, jitter } => {
                let multiplier = 2u64.saturating_pow(retry.saturating_sub(1) as u32);
                let base_delay = self
                    .delay
                    .saturating_mul(multiplier.try_into().unwrap_or(u32::MAX));
                let delay = base_delay.min(max_delay);

                if jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    delay.mul_f64(jitter_factor)
                } else {
                    delay
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_delays() {
        let policy = RetryPolicy::exponential(
            5,
            Duration::from_millis(100),
            Duration::from_millis(1000),
            false,
        );

        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_retry(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for_retry(5), Duration::from_millis(1000));
    }

    #[test]
    fn test_exponential_jitter_stays_in_range() {
        let policy = RetryPolicy::exponential(
            3,
            Duration::from_millis(200),
            Duration::from_secs(10),
            true,
        );

        for _ in 0..20 {
            let delay = policy.delay_for_retry(2);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(400));
        }
    }

    #[test]
    fn test_fixed_delays() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));

        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(1));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 0);
        assert_eq!(policy.delay, DEFAULT_RETRY_DELAY);
        assert_eq!(policy, RetryPolicy::none());
    }
}
