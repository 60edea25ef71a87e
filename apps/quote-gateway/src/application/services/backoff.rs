//! Poll Backoff
//!
//! Exponential backoff with jitter for consecutive upstream failures.
//! A poller never gives up, so the policy has no attempt limit: the delay
//! grows to `max_delay` and stays there until [`BackoffPolicy::reset`].

use std::time::Duration;

use rand::Rng;

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
    /// Growth factor applied after each failure.
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Same parameters with jitter disabled.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_factor = 0.0;
        self
    }
}

/// Stateful backoff for one poller.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use quote_gateway::application::services::backoff::{BackoffConfig, BackoffPolicy};
///
/// let mut policy = BackoffPolicy::new(BackoffConfig::default().without_jitter());
/// assert_eq!(policy.next_delay(), Duration::from_secs(1));
/// assert_eq!(policy.next_delay(), Duration::from_secs(2));
///
/// policy.reset();
/// assert_eq!(policy.failures(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    config: BackoffConfig,
    current_delay: Duration,
    failures: u32,
}

impl BackoffPolicy {
    /// Create a policy at its initial delay.
    #[must_use]
    pub const fn new(config: BackoffConfig) -> Self {
        let current_delay = config.initial_delay;
        Self {
            config,
            current_delay,
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = self.jittered(self.current_delay);
        self.current_delay = self.grow(self.current_delay);
        delay
    }

    /// Return to the initial delay after a success.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.failures = 0;
    }

    /// Consecutive failures since the last reset.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    fn grow(&self, delay: Duration) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let scaled = (delay.as_millis() as f64 * self.config.multiplier).round();
        let max_millis = u64::try_from(self.config.max_delay.as_millis()).unwrap_or(u64::MAX);

        if !scaled.is_finite() || scaled <= 0.0 {
            return self.config.initial_delay.min(self.config.max_delay);
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = scaled as u64;
        Duration::from_millis(millis.min(max_millis))
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return delay;
        }

        #[allow(clippy::cast_precision_loss)]
        let base = delay.as_millis() as f64;
        let spread = base * self.config.jitter_factor;
        let offset: f64 = rand::rng().random_range(-spread..=spread);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = (base + offset).max(1.0) as u64;
        Duration::from_millis(millis)
    }
}
