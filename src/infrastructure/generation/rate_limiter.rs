use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::RateLimitConfig;

/// Token bucket rate limiter for generation requests
///
/// Thin wrapper over a direct `governor` limiter: `requests_per_second`
/// sets the replenish interval and `burst_size` the bucket capacity.
#[derive(Clone)]
pub struct GenerationRateLimiter {
    inner: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl GenerationRateLimiter {
    /// Non-positive or non-finite rates fall back to one request per second.
    pub fn new(requests_per_second: f64, burst_size: u32) -> Self {
        let period = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::from_secs(1)
        };
        let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            inner: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wait until a request slot is available.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }

    /// Take a slot without waiting; false when the bucket is empty.
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }
}

impl From<&RateLimitConfig> for GenerationRateLimiter {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }
}

impl std::fmt::Debug for GenerationRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_exhausted() {
        let limiter = GenerationRateLimiter::new(0.001, 2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_invalid_settings_fall_back() {
        let limiter = GenerationRateLimiter::new(-1.0, 0);
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_within_burst_is_immediate() {
        let limiter = GenerationRateLimiter::new(1.0, 3);
        let start = std::time::Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
