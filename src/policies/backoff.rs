//! # Backoff policy for detach retries.
//!
//! [`BackoffPolicy`] controls the pause between two detach attempts of the
//! same contributor. It is parameterized by:
//! - [`BackoffPolicy::first`] the pause before the second attempt;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum pause.
//!
//! The pause after attempt `n` is `first × factor^n`, clamped to `max`, then
//! jitter is applied. The default is a constant 250ms pause.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use roomvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(2),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(250));
//! assert_eq!(backoff.next(1), Duration::from_millis(500));
//! assert_eq!(backoff.next(10), Duration::from_secs(2));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Pause policy between detach retries.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Pause after the first failed attempt.
    pub first: Duration,
    /// Maximum pause.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant).
    pub factor: f64,
    /// Jitter applied to the clamped pause.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 250ms pause without jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(250),
            max: Duration::from_millis(250),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the pause after the given failed attempt (0-indexed).
    ///
    /// Non-finite or negative intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_constant_quarter_second() {
        let policy = BackoffPolicy::default();
        for attempt in [0, 1, 5, 1_000] {
            assert_eq!(policy.next(attempt), Duration::from_millis(250));
        }
    }

    #[test]
    fn exponential_growth_is_capped() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(2), Duration::from_millis(400));
        assert_eq!(policy.next(4), Duration::from_secs(1));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn first_exceeding_max_is_clamped() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 1.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn jitter_never_exceeds_clamped_base() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(300),
            max: Duration::from_millis(300),
            factor: 1.0,
            jitter: JitterPolicy::Full,
        };
        for attempt in 0..50 {
            assert!(policy.next(attempt) <= Duration::from_millis(300));
        }
    }
}
