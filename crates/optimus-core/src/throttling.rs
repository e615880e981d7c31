use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Local request budget for one provider.
///
/// Calls over budget are refused without touching the network; the adapter
/// reports them as rate limited so the retry controller backs off exactly as
/// it would for an upstream 429.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DirectRateLimiter>,
    cell_period: Duration,
}

impl Throttle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let (quota, cell_period) = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            cell_period,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Takes one unit of budget, or returns roughly how long until one frees up.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter.check().map_err(|_| self.cell_period)
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("cell_period", &self.cell_period)
            .finish()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> (Quota, Duration) {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    (quota, period)
}
