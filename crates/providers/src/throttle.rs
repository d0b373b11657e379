//! Outbound request throttling for language-model calls.
//!
//! The gateway acquires one permit per attempt. The throttle is an explicit
//! dependency (`Arc<dyn Throttle>`) so tests can pass [`NoThrottle`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use tactico_config::ThrottleConfig;

/// Longest single sleep; the bucket is re-checked after each one.
const MAX_WAIT: Duration = Duration::from_secs(60);

/// Grants permission to send one request.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until a request may be sent.
    async fn acquire(&self);
}

/// A throttle that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoThrottle;

#[async_trait]
impl Throttle for NoThrottle {
    async fn acquire(&self) {}
}

/// Token-bucket limiter: `burst` requests back-to-back, then `rate` per second.
///
/// Safe to share across concurrent runs; permits are handed out under a
/// single lock so the combined rate never exceeds the configuration.
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// `rate` must be positive and `burst` at least 1.
    pub fn new(rate: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            rate,
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }
}

#[async_trait]
impl Throttle for TokenBucket {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::try_from_secs_f64((1.0 - state.tokens) / self.rate)
                    .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT))
            };
            trace!(wait_ms = wait.as_millis() as u64, "Throttled, waiting for a permit");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Build the throttle described by `config`. A zero rate disables throttling.
pub fn from_config(config: &ThrottleConfig) -> Arc<dyn Throttle> {
    if config.requests_per_second > 0.0 {
        Arc::new(TokenBucket::new(config.requests_per_second, config.burst))
    } else {
        Arc::new(NoThrottle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_is_immediate() {
        let bucket = TokenBucket::new(1.0, 2);
        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn requests_beyond_burst_are_spaced() {
        let bucket = TokenBucket::new(2.0, 1);
        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        bucket.acquire().await;
        // two extra permits at 2/s need at least one second
        assert!(start.elapsed() >= Duration::from_millis(999));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn bucket_refills_while_idle() {
        let bucket = TokenBucket::new(1.0, 2);
        bucket.acquire().await;
        bucket.acquire().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn tiny_rate_waits_without_overflowing() {
        let throttle = from_config(&ThrottleConfig {
            requests_per_second: 1e-20,
            burst: 1,
        });
        throttle.acquire().await;
        let second = tokio::time::timeout(Duration::from_secs(600), throttle.acquire()).await;
        assert!(second.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_rate_config_disables_throttle() {
        let throttle = from_config(&ThrottleConfig {
            requests_per_second: 0.0,
            burst: 0,
        });
        let start = Instant::now();
        for _ in 0..10 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}
