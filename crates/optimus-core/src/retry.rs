//! Bounded retry with exponential backoff and jitter around one upstream fetch.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::data_source::{HistoryProvider, HistoryRequest, SourceError, SourceErrorKind};
use crate::normalizer::QuoteNormalizer;
use crate::random::RandomSource;
use crate::{Quote, QuoteError, QuoteSource, Symbol};

/// Default number of upstream attempts per symbol.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed { delay: Duration },
    /// `base * factor^attempt + jitter * u` with `u` uniform in `[0, 1)`.
    ///
    /// Jitter only ever adds, so the delay never drops below the exponential
    /// floor. `max`, when set, caps the total.
    Exponential {
        base: Duration,
        factor: f64,
        jitter: Duration,
        max: Option<Duration>,
    },
}

impl Default for Backoff {
    /// `2^attempt + uniform(0, 1)` seconds, uncapped.
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            factor: 2.0,
            jitter: Duration::from_secs(1),
            max: None,
        }
    }
}

impl Backoff {
    /// Delay before attempt number `attempt` (0-based). Attempt 0 never waits.
    pub fn delay(self, attempt: u32, random: &dyn RandomSource) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { jitter, max, .. } => {
                let jitter_seconds = jitter.as_secs_f64() * random.unit().clamp(0.0, 1.0);
                let total = self.floor(attempt).saturating_add(seconds(jitter_seconds));
                max.map_or(total, |max| total.min(max))
            }
        }
    }

    /// Delay without jitter.
    pub fn floor(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, factor, .. } => {
                let scale = factor.max(0.0).powf(f64::from(attempt));
                seconds(base.as_secs_f64() * scale)
            }
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

/// Milliseconds for log fields, saturating instead of truncating.
fn whole_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

enum Transient {
    RateLimited,
    Empty,
}

/// Wraps a single upstream fetch with bounded retry.
///
/// Errors the adapter marks retryable (rate limits, empty payloads) are
/// retried; on the last attempt they surface as
/// [`QuoteError::RetryExhausted`] and [`QuoteError::NoData`]. Anything else
/// (missing fields, unavailable upstreams) fails immediately without using
/// the remaining attempts.
#[derive(Clone)]
pub struct RetryController {
    provider: Arc<dyn HistoryProvider>,
    normalizer: QuoteNormalizer,
    backoff: Backoff,
    random: Arc<dyn RandomSource>,
}

impl RetryController {
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        normalizer: QuoteNormalizer,
        backoff: Backoff,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            provider,
            normalizer,
            backoff,
            random,
        }
    }

    pub fn provider(&self) -> &dyn HistoryProvider {
        self.provider.as_ref()
    }

    /// Fetches and normalizes one quote. `max_attempts` of zero is treated as one.
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        request: &HistoryRequest,
        max_attempts: u32,
    ) -> Result<Quote, QuoteError> {
        let max_attempts = max_attempts.max(1);
        let source = QuoteSource::Provider(self.provider.id());
        let mut attempts = 0;

        loop {
            attempts += 1;

            let (transient, reason) = match self.provider.fetch_history(request).await {
                Ok(history) if history.is_empty() => {
                    (Transient::Empty, String::from("empty history"))
                }
                Ok(history) => return self.normalizer.normalize(symbol, &history, source),
                Err(error) if !error.retryable() => return Err(fatal(symbol, &error)),
                Err(error) => {
                    let transient = match error.kind() {
                        SourceErrorKind::RateLimited => Transient::RateLimited,
                        _ => Transient::Empty,
                    };
                    (transient, error.message().to_owned())
                }
            };

            if attempts >= max_attempts {
                return Err(match transient {
                    Transient::RateLimited => QuoteError::RetryExhausted {
                        symbol: symbol.to_string(),
                        attempts,
                    },
                    Transient::Empty => QuoteError::NoData {
                        symbol: symbol.to_string(),
                        attempts,
                    },
                });
            }

            let delay = self.backoff.delay(attempts, self.random.as_ref());
            let delay_ms = whole_millis(delay);
            match transient {
                Transient::RateLimited => {
                    warn!(symbol = %symbol, attempt = attempts, delay_ms, %reason, "rate limited, backing off");
                }
                Transient::Empty => {
                    info!(symbol = %symbol, attempt = attempts, delay_ms, %reason, "no rows yet, retrying");
                }
            }
            tokio::time::sleep(delay).await;
        }
    }
}

/// Maps an error the adapter marked non-retryable onto the service taxonomy.
fn fatal(symbol: &Symbol, error: &SourceError) -> QuoteError {
    match error.kind() {
        SourceErrorKind::MissingField => QuoteError::MissingField {
            symbol: symbol.to_string(),
            field: "close",
        },
        _ => QuoteError::UpstreamUnavailable {
            symbol: symbol.to_string(),
            message: error.message().to_owned(),
        },
    }
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("provider", &self.provider.id())
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
