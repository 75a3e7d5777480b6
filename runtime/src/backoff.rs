//! Reconnect policy with exponential backoff.
//!
//! After the `n`-th consecutive failure the channel waits
//! `min(initial_delay * multiplier^n, max_delay)` before trying again. With
//! the defaults that is 2s, 4s, 8s, 16s, 30s; the sixth consecutive failure
//! is terminal.
//!
//! # Example
//!
//! ```rust
//! use seatmap_runtime::backoff::{Backoff, ReconnectPolicy};
//! use std::time::Duration;
//!
//! let policy = ReconnectPolicy::builder()
//!     .max_attempts(5)
//!     .initial_delay(Duration::from_millis(1000))
//!     .max_delay(Duration::from_secs(30))
//!     .build();
//!
//! let mut backoff = Backoff::new(policy);
//! assert_eq!(backoff.next_delay(), Some(Duration::from_secs(2)));
//! ```

use std::time::Duration;

/// Reconnect policy configuration for exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `initial_delay`: 1000ms
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0 (delay doubles each failure)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Automatic retries before giving up
    pub max_attempts: u32,
    /// Base delay
    pub initial_delay: Duration,
    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReconnectPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> ReconnectPolicyBuilder {
        ReconnectPolicyBuilder {
            max_attempts: None,
            initial_delay: None,
            max_delay: None,
            multiplier: None,
        }
    }

    /// Calculate the delay after the given number of consecutive failures.
    ///
    /// Uses exponential backoff: delay = `initial_delay` * (multiplier ^ attempt),
    /// capped at `max_delay`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )] // Delays are small positive millisecond counts
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);

        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }
}

/// Builder for [`ReconnectPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicyBuilder {
    max_attempts: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
}

impl ReconnectPolicyBuilder {
    /// Set the number of automatic retries.
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the base delay.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set maximum delay (cap for exponential backoff).
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set multiplier for exponential backoff.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Build the [`ReconnectPolicy`].
    #[must_use]
    pub fn build(self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_attempts.unwrap_or(5),
            initial_delay: self.initial_delay.unwrap_or(Duration::from_millis(1000)),
            max_delay: self.max_delay.unwrap_or(Duration::from_secs(30)),
            multiplier: self.multiplier.unwrap_or(2.0),
        }
    }
}

/// Consecutive-failure counter driven by a [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    /// Creates a counter at zero failures
    #[must_use]
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Consecutive failures recorded so far
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure and return how long to wait before retrying.
    ///
    /// Returns `None` once the failure count exceeds `max_attempts`; no further
    /// retry should be scheduled.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt = self.attempt.saturating_add(1);
        if self.attempt > self.policy.max_attempts {
            return None;
        }
        Some(self.policy.delay_for_attempt(self.attempt))
    }

    /// Forget all failures (after a successful handshake or a manual reconnect)
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }
}
