use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Pause policy between feed requests. Injected so tests can run without
/// real sleeps.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a uniform random duration between configured bounds, roughly the
/// cadence of a person swiping through the app.
#[derive(Debug, Clone)]
pub struct UniformPacer {
    min_secs: f64,
    max_secs: f64,
}

impl UniformPacer {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let min_secs = min_secs.max(0.0);
        let max_secs = max_secs.max(min_secs);
        Self { min_secs, max_secs }
    }

    pub(crate) fn sample(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rand::thread_rng().gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs)
    }
}

#[async_trait]
impl Pacer for UniformPacer {
    async fn pause(&self) {
        let delay = self.sample();
        debug!("Pausing for {:?} before next request", delay);
        tokio::time::sleep(delay).await;
    }
}

/// No pause at all. Test use only, where pacing would just slow the suite.
#[derive(Debug, Clone, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests_pacing {
    use super::*;

    #[test]
    fn test_sample_stays_within_bounds() {
        let pacer = UniformPacer::new(0.5, 2.0);
        for _ in 0..200 {
            let d = pacer.sample();
            assert!(d >= Duration::from_secs_f64(0.5));
            assert!(d <= Duration::from_secs_f64(2.0));
        }
    }

    #[test]
    fn test_inverted_bounds_collapse_to_min() {
        let pacer = UniformPacer::new(3.0, 1.0);
        for _ in 0..50 {
            assert_eq!(pacer.sample(), Duration::from_secs_f64(3.0));
        }
    }

    #[test]
    fn test_negative_bounds_clamped() {
        let pacer = UniformPacer::new(-2.0, -1.0);
        assert_eq!(pacer.sample(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_noop_pacer_returns_immediately() {
        let start = std::time::Instant::now();
        NoopPacer.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
