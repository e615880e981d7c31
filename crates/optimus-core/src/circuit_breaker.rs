//! Circuit breaker in front of an adapter's network calls.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::data_source::HealthState;
use crate::ProviderId;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub const fn health(self) -> HealthState {
        match self {
            Self::Closed => HealthState::Healthy,
            Self::HalfOpen => HealthState::Degraded,
            Self::Open => HealthState::Unhealthy,
        }
    }
}

/// Consecutive transport failures before opening, and how long to stay open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { since: Instant, failures: u32 },
    HalfOpen { failures: u32 },
}

impl Phase {
    const fn failures(self) -> u32 {
        match self {
            Self::Closed { failures } | Self::Open { failures, .. } | Self::HalfOpen { failures } => {
                failures
            }
        }
    }

    const fn state(self) -> CircuitState {
        match self {
            Self::Closed { .. } => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

/// Thread-safe circuit breaker for one provider.
///
/// Only transport-level failures count. Rate limits and empty payloads mean
/// the upstream is alive and are left to the retry controller. After
/// `open_timeout` one trial call is let through; its outcome closes or
/// reopens the breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: ProviderId,
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::for_provider(ProviderId::Yahoo, config)
    }

    pub fn for_provider(provider: ProviderId, config: CircuitBreakerConfig) -> Self {
        Self {
            provider,
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call may go out now.
    pub fn allow_request(&self) -> bool {
        let mut phase = self.lock();
        let current = *phase;
        match current {
            Phase::Closed { .. } | Phase::HalfOpen { .. } => true,
            Phase::Open { since, failures } => {
                if since.elapsed() < self.config.open_timeout {
                    return false;
                }
                *phase = Phase::HalfOpen { failures };
                info!(provider = self.provider.as_str(), "circuit breaker half-open, letting one call through");
                true
            }
        }
    }

    pub fn record_success(&self) {
        let mut phase = self.lock();
        if matches!(*phase, Phase::HalfOpen { .. }) {
            info!(provider = self.provider.as_str(), "circuit breaker closed");
        }
        *phase = Phase::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut phase = self.lock();
        let current = *phase;
        let failures = current.failures().saturating_add(1);

        let opens = match current {
            Phase::Closed { .. } => failures >= self.config.failure_threshold,
            Phase::HalfOpen { .. } => true,
            Phase::Open { .. } => false,
        };

        *phase = match current {
            Phase::Open { since, .. } => Phase::Open { since, failures },
            _ if opens => Phase::Open {
                since: Instant::now(),
                failures,
            },
            _ => Phase::Closed { failures },
        };

        if opens {
            warn!(
                provider = self.provider.as_str(),
                failures,
                open_for_ms = u64::try_from(self.config.open_timeout.as_millis()).unwrap_or(u64::MAX),
                "circuit breaker opened"
            );
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().failures()
    }
}
