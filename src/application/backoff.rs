//! Retry policy for failed attempts.

use std::time::Duration;

use rand::Rng;

use crate::domain::FailureClass;

/// Consistency failures get exactly one extra attempt.
const CONSISTENCY_ATTEMPTS: u32 = 2;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Exponential backoff with bounded jitter.
///
/// The delay before attempt `n + 1` is `base * 2^(n-1)`, capped at `max`,
/// plus up to 10% random jitter (still capped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    max: Duration,
    jitter: bool,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            base,
            max,
            jitter: true,
        }
    }

    /// Deterministic delays, for tests and reproducible runs.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide after attempt number `attempts` failed with `class`.
    #[must_use]
    pub fn decide(&self, class: FailureClass, attempts: u32) -> RetryDecision {
        let ceiling = match class {
            FailureClass::Permanent => return RetryDecision::GiveUp,
            FailureClass::Consistency => CONSISTENCY_ATTEMPTS.min(self.max_attempts),
            FailureClass::Transient => self.max_attempts,
        };
        if attempts >= ceiling {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry(self.delay(attempts))
        }
    }

    /// Backoff before the attempt following attempt number `attempts`.
    #[must_use]
    pub fn delay(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        let raw = self.base.saturating_mul(factor).min(self.max);
        if !self.jitter || raw.is_zero() {
            return raw;
        }
        let jitter = rand::thread_rng().gen_range(0.0..=0.1);
        raw.saturating_add(raw.mul_f64(jitter)).min(self.max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(200), Duration::from_secs(10))
    }
}
