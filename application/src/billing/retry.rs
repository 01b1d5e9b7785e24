use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Upper bound for the configured base backoff.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// How many times a contended charge is re-run before the contention is
/// reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
    jitter_max_percent: u8,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_ms: u64, jitter_max_percent: u8) -> AppResult<Self> {
        if max_attempts == 0 {
            return Err(AppError::ConfigError {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }
        if jitter_max_percent > 100 {
            return Err(AppError::ConfigError {
                message: "jitter_max_percent must be <= 100".to_string(),
            });
        }
        if backoff_ms > MAX_BACKOFF_MS {
            return Err(AppError::ConfigError {
                message: format!("backoff_ms must be <= {MAX_BACKOFF_MS}"),
            });
        }
        Ok(Self {
            max_attempts,
            backoff: Duration::from_millis(backoff_ms),
            jitter_max_percent,
        })
    }

    #[must_use]
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
            jitter_max_percent: 0,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, growing linearly with the number of
    /// attempts already made.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let base = self.backoff.saturating_mul(attempt);
        if base.is_zero() || self.jitter_max_percent == 0 {
            return base;
        }

        let max_factor = 1.0 + f64::from(self.jitter_max_percent) / 100.0;
        let jitter_factor = rand::rng().random_range(1.0..=max_factor);
        Duration::try_from_secs_f64(base.as_secs_f64() * jitter_factor).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_attempt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_attempts() {
        assert!(RetryPolicy::new(0, 10, 0).is_err());
        assert!(RetryPolicy::new(1, 10, 101).is_err());
    }

    #[test]
    fn delay_grows_with_attempts() -> AppResult<()> {
        let policy = RetryPolicy::new(3, 10, 0)?;
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(20));
        Ok(())
    }

    #[test]
    fn jitter_stays_within_bounds() -> AppResult<()> {
        let policy = RetryPolicy::new(5, 100, 20)?;
        for _ in 0..50 {
            let delay = policy.delay_after(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(120));
        }
        Ok(())
    }

    #[test]
    fn rejects_backoff_above_the_bound() {
        assert!(RetryPolicy::new(3, MAX_BACKOFF_MS + 1, 0).is_err());
        assert!(RetryPolicy::new(u32::MAX, u64::MAX, 20).is_err());
    }

    #[test]
    fn late_attempts_with_jitter_do_not_overflow() -> AppResult<()> {
        let policy = RetryPolicy::new(u32::MAX, MAX_BACKOFF_MS, 100)?;

        let delay = policy.delay_after(u32::MAX);
        assert!(delay >= Duration::from_millis(MAX_BACKOFF_MS));
        Ok(())
    }

    #[test]
    fn single_attempt_never_waits() {
        assert_eq!(RetryPolicy::single_attempt().delay_after(1), Duration::ZERO);
    }
}
