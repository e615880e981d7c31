//! The quote service: the function-call boundary external callers use.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::YahooAdapter;
use crate::batch::{prepare_symbols, BatchResult};
use crate::cache::{CacheMode, CacheSnapshot, QuoteCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{FetchMode, ServiceConfig};
use crate::data_source::{HealthState, HistoryProvider, HistoryRequest};
use crate::fallback::FallbackGenerator;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::normalizer::QuoteNormalizer;
use crate::random::{FastrandSource, RandomSource};
use crate::retry::{Backoff, RetryController};
use crate::{ProviderId, QualifiedSymbol, Quote, QuoteError, Symbol, ValidationError};

/// Outcome of [`QuoteService::clear_cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub removed_count: usize,
}

/// Outcome of [`QuoteService::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub cache_entries: usize,
    pub cache_ttl_seconds: u64,
    pub mode: FetchMode,
    pub provider: ProviderId,
    pub provider_health: HealthState,
}

/// Cache, retry, normalization, fallback and batching behind one object.
///
/// Per symbol: fresh cache hit, else (under the key's refresh guard) an
/// upstream fetch with retry, then a cache write. In
/// [`FetchMode::Fallback`] upstream failures become synthetic quotes flagged
/// with `isMocked`. Synthetic quotes are never cached, so the next call asks
/// the upstream again.
#[derive(Debug, Clone)]
pub struct QuoteService {
    config: ServiceConfig,
    cache: QuoteCache,
    retry: RetryController,
    fallback: FallbackGenerator,
}

impl QuoteService {
    pub fn builder() -> QuoteServiceBuilder {
        QuoteServiceBuilder::default()
    }

    /// Yahoo-backed service configured from `OPTIMUS_*` variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Ok(Self::builder().config(ServiceConfig::from_env()?).build())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        self.get_quote_with(symbol, CacheMode::Use).await
    }

    pub async fn get_quote_with(&self, symbol: &str, mode: CacheMode) -> Result<Quote, QuoteError> {
        let symbol = Symbol::parse(symbol)?;
        self.quote_for(&symbol, mode).await
    }

    /// Fetches every symbol, isolating failures per symbol.
    ///
    /// Empty input and batches over the ceiling are rejected before any
    /// upstream call.
    pub async fn get_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Result<BatchResult, QuoteError> {
        let inputs = prepare_symbols(symbols, self.config.max_batch_symbols)?;
        let total_requested = inputs.len();

        let outcomes = stream::iter(inputs)
            .map(|raw| async move {
                match Symbol::parse(&raw) {
                    Ok(symbol) => {
                        let outcome = self.quote_for(&symbol, CacheMode::Use).await;
                        (symbol.to_string(), outcome)
                    }
                    Err(error) => (raw, Err(QuoteError::from(error))),
                }
            })
            .buffered(self.config.batch_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let result = BatchResult::from_outcomes(total_requested, outcomes);
        info!(
            requested = result.total_requested,
            successful = result.total_successful,
            failed = result.error_count(),
            "batch complete"
        );
        Ok(result)
    }

    pub async fn clear_cache(&self) -> ClearReport {
        let removed_count = self.cache.clear().await;
        info!(removed = removed_count, "cache cleared");
        ClearReport { removed_count }
    }

    pub async fn cache_status(&self) -> CacheSnapshot {
        self.cache.snapshot().await
    }

    pub async fn status(&self) -> ServiceStatus {
        let provider = self.retry.provider();
        ServiceStatus {
            cache_entries: self.cache.len().await,
            cache_ttl_seconds: self.cache.ttl().as_secs(),
            mode: self.config.fetch_mode,
            provider: provider.id(),
            provider_health: provider.health(),
        }
    }

    async fn quote_for(&self, symbol: &Symbol, mode: CacheMode) -> Result<Quote, QuoteError> {
        let key = self.config.market.qualify(symbol);

        if mode.reads() {
            if let Some(quote) = self.fresh(symbol, &key).await {
                debug!(symbol = %symbol, key = %key, "cache hit");
                return Ok(quote);
            }
        }

        let guard = self.cache.refresh_guard(&key);
        let _refreshing = guard.lock().await;

        if mode.reads() {
            if let Some(quote) = self.fresh(symbol, &key).await {
                debug!(symbol = %symbol, key = %key, "refreshed by a concurrent caller");
                return Ok(quote);
            }
        }

        let error = match self.fetch_upstream(symbol, &key).await {
            Ok(quote) => {
                if mode.writes() {
                    self.cache.store(key, quote.clone()).await;
                }
                return Ok(quote);
            }
            Err(error) => error,
        };

        if error.is_upstream() && self.config.fetch_mode == FetchMode::Fallback {
            warn!(symbol = %symbol, code = error.code(), %error, "upstream failed, serving synthetic quote");
            return Ok(self.fallback.generate(symbol));
        }
        Err(error)
    }

    /// A fresh entry, labelled with the caller's spelling of the symbol.
    async fn fresh(&self, symbol: &Symbol, key: &QualifiedSymbol) -> Option<Quote> {
        self.cache
            .lookup(key)
            .await
            .filter(|cached| cached.fresh)
            .map(|cached| cached.quote.with_symbol(symbol.clone()))
    }

    async fn fetch_upstream(&self, symbol: &Symbol, key: &QualifiedSymbol) -> Result<Quote, QuoteError> {
        let request = HistoryRequest::with_range(key.clone(), self.config.period, self.config.interval);
        let quote = self.retry.fetch(symbol, &request, self.config.max_attempts).await?;
        info!(symbol = %symbol, key = %key, price = quote.price(), "fetched quote");
        Ok(quote)
    }
}

/// Wires a [`QuoteService`]. Anything not set gets its production default:
/// Yahoo adapter, system clock, unseeded `fastrand`, default backoff.
#[derive(Default)]
pub struct QuoteServiceBuilder {
    config: ServiceConfig,
    provider: Option<Arc<dyn HistoryProvider>>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    random: Option<Arc<dyn RandomSource>>,
    backoff: Option<Backoff>,
}

impl QuoteServiceBuilder {
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn HistoryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Transport for the default Yahoo adapter. Ignored when a provider is set.
    pub fn http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn build(self) -> QuoteService {
        let config = self.config;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let random = self
            .random
            .unwrap_or_else(|| Arc::new(FastrandSource::new()));

        let provider = self.provider.unwrap_or_else(|| {
            let http_client = self
                .http_client
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
            let timeout_ms = u64::try_from(config.request_timeout.as_millis()).unwrap_or(u64::MAX);
            Arc::new(YahooAdapter::with_http_client(http_client).with_timeout_ms(timeout_ms))
        });

        let normalizer = QuoteNormalizer::new(config.market.clone(), clock.clone());
        let retry = RetryController::new(
            provider,
            normalizer,
            self.backoff.unwrap_or_default(),
            random.clone(),
        );
        let fallback = FallbackGenerator::new(config.market.clone(), clock.clone(), random);
        let cache = QuoteCache::new(config.cache_ttl, clock);

        QuoteService {
            config,
            cache,
            retry,
            fallback,
        }
    }
}
