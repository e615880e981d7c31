//! Service configuration and environment loading.

use std::env;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::cache::DEFAULT_TTL;
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::retry::DEFAULT_MAX_ATTEMPTS;
use crate::{Interval, Market, Period, ValidationError};

pub const ENV_CACHE_TTL_SECS: &str = "OPTIMUS_CACHE_TTL_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "OPTIMUS_MAX_ATTEMPTS";
pub const ENV_MAX_BATCH_SYMBOLS: &str = "OPTIMUS_MAX_BATCH_SYMBOLS";
pub const ENV_FETCH_MODE: &str = "OPTIMUS_FETCH_MODE";
pub const ENV_MARKET: &str = "OPTIMUS_MARKET";
pub const ENV_BATCH_CONCURRENCY: &str = "OPTIMUS_BATCH_CONCURRENCY";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "OPTIMUS_REQUEST_TIMEOUT_MS";

/// Batch ceiling used when nothing else is configured.
pub const DEFAULT_MAX_BATCH_SYMBOLS: usize = 20;

/// What to do when the upstream cannot produce a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Surface the error.
    #[default]
    Strict,
    /// Substitute a synthetic quote.
    Fallback,
}

impl FetchMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Fallback => "fallback",
        }
    }
}

impl Display for FetchMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "fallback" => Ok(Self::Fallback),
            other => Err(ValidationError::InvalidFetchMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Knobs of the quote service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub cache_ttl: Duration,
    pub max_attempts: u32,
    pub max_batch_symbols: usize,
    pub fetch_mode: FetchMode,
    pub market: Market,
    pub batch_concurrency: usize,
    pub period: Period,
    pub interval: Interval,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_batch_symbols: DEFAULT_MAX_BATCH_SYMBOLS,
            fetch_mode: FetchMode::Strict,
            market: Market::b3(),
            batch_concurrency: 1,
            period: Period::default(),
            interval: Interval::default(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `OPTIMUS_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with an arbitrary key lookup.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = get(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_number(ENV_CACHE_TTL_SECS, &value)?);
        }
        if let Some(value) = get(ENV_MAX_ATTEMPTS) {
            config.max_attempts = parse_number(ENV_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = get(ENV_MAX_BATCH_SYMBOLS) {
            config.max_batch_symbols = parse_positive(ENV_MAX_BATCH_SYMBOLS, &value)?;
        }
        if let Some(value) = get(ENV_FETCH_MODE) {
            config.fetch_mode = value.parse()?;
        }
        if let Some(value) = get(ENV_MARKET) {
            config.market = value.parse()?;
        }
        if let Some(value) = get(ENV_BATCH_CONCURRENCY) {
            config.batch_concurrency = parse_positive(ENV_BATCH_CONCURRENCY, &value)?;
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout =
                Duration::from_millis(parse_positive(ENV_REQUEST_TIMEOUT_MS, &value)?);
        }

        Ok(config)
    }

    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn with_batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.batch_concurrency = batch_concurrency.max(1);
        self
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidConfig {
        key,
        value: value.to_owned(),
    })
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ValidationError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_number(key, value)?;
    if parsed <= T::default() {
        return Err(ValidationError::InvalidConfig {
            key,
            value: value.to_owned(),
        });
    }
    Ok(parsed)
}
