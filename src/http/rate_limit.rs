//! Token bucket rate limiting for outbound fetches
//!
//! Built on the governor crate. One limiter per fetch client, waited on
//! before every attempt, so a retry storm against a flaky upstream still
//! stays within the source's allowed request rate.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Requests-per-second limiter shared by all attempts of a fetch client
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<DirectLimiter>,
}

impl RateLimit {
    /// Create a limiter allowing `rps` requests per second with an equal burst
    pub fn per_second(rps: u32) -> Self {
        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps).allow_burst(rps);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wait until a request may be made
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimit").finish()
    }
}
