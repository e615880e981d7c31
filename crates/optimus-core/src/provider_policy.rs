use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::ProviderId;

/// Client-side limits applied by an adapter before it goes to the network.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub circuit: CircuitBreakerConfig,
}

impl ProviderPolicy {
    /// Yahoo publishes no quota for the chart endpoint; 60 calls a minute keeps
    /// a batch of 20 with full retries well below where 429s start.
    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            circuit: CircuitBreakerConfig {
                failure_threshold: 5,
                open_timeout: Duration::from_secs(30),
            },
        }
    }

    pub fn with_quota(mut self, quota_window: Duration, quota_limit: u32) -> Self {
        self.quota_window = quota_window;
        self.quota_limit = quota_limit;
        self
    }
}
