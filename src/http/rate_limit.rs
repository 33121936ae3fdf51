//! Call-rate budget
//!
//! Uses the governor crate for token bucket rate limiting. A budget is
//! acquired before every attempt, including retries, so backoff sleeps and
//! rate-limit waits compose rather than race.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the call-rate budget
#[derive(Debug, Clone)]
pub struct ApiBudgetConfig {
    /// Maximum number of calls per second
    pub calls_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for ApiBudgetConfig {
    fn default() -> Self {
        Self {
            calls_per_second: 10,
            burst_size: 10,
        }
    }
}

impl ApiBudgetConfig {
    /// Create a new budget config
    pub fn new(calls_per_second: u32, burst_size: u32) -> Self {
        Self {
            calls_per_second,
            burst_size,
        }
    }

    /// Create a budget allowing `n` calls per second with an equal burst
    pub fn per_second(n: u32) -> Self {
        Self::new(n, n)
    }
}

/// Token bucket call-rate budget shared across the attempts of one client
#[derive(Clone)]
pub struct ApiBudget {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl ApiBudget {
    /// Create a budget with the given config
    pub fn new(config: &ApiBudgetConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.calls_per_second).unwrap_or(NonZeroU32::new(1).unwrap()),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::new(1).unwrap()));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a call may be made
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Wait with a timeout; `false` means the budget was not acquired
    pub async fn acquire_with_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.limiter.until_ready())
            .await
            .is_ok()
    }
}

impl Default for ApiBudget {
    fn default() -> Self {
        Self::new(&ApiBudgetConfig::default())
    }
}

impl std::fmt::Debug for ApiBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiBudget").finish()
    }
}
