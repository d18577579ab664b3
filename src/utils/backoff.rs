use rand::Rng;
use std::time::Duration;

const MAX_DELAY: Duration = Duration::from_secs(60);

/// Exponential backoff schedule for transient request failures. Delay for
/// attempt `n` (0-based) is `base * 3^n` plus up to half of that in jitter,
/// capped at one minute. A zero base yields zero delays.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base
            .saturating_mul(3u32.saturating_pow(attempt))
            .min(MAX_DELAY);
        if exp.is_zero() {
            return Duration::ZERO;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=(exp.as_millis() as u64 / 2).max(1));
        (exp + Duration::from_millis(jitter_ms)).min(MAX_DELAY)
    }
}

#[cfg(test)]
mod tests_backoff {
    use super::*;

    #[test]
    fn test_delay_grows_exponentially() {
        let backoff = Backoff::new(Duration::from_millis(100), 5);
        for _ in 0..50 {
            let d0 = backoff.delay(0);
            let d2 = backoff.delay(2);
            assert!(d0 >= Duration::from_millis(100));
            assert!(d0 <= Duration::from_millis(150));
            assert!(d2 >= Duration::from_millis(900));
            assert!(d2 <= Duration::from_millis(1350));
        }
    }

    #[test]
    fn test_delay_is_capped() {
        let backoff = Backoff::new(Duration::from_secs(10), 10);
        assert!(backoff.delay(8) <= Duration::from_secs(60));
    }

    #[test]
    fn test_zero_base_yields_zero_delay() {
        let backoff = Backoff::new(Duration::ZERO, 3);
        assert_eq!(backoff.delay(0), Duration::ZERO);
        assert_eq!(backoff.delay(5), Duration::ZERO);
    }

    #[test]
    fn test_at_least_one_attempt() {
        let backoff = Backoff::new(Duration::from_millis(10), 0);
        assert_eq!(backoff.max_attempts(), 1);
    }
}
