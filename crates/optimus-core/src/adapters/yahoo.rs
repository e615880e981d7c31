use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{HealthState, HistoryProvider, HistoryRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::Throttle;
use crate::{HistoryRow, PriceHistory, ProviderId, QualifiedSymbol, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance v8 chart adapter.
///
/// One `fetch_history` call is one GET to `/v8/finance/chart/{symbol}`. Status
/// mapping: 429 is rate limited, 404 or a chart-level error is no data, any
/// other non-2xx or transport failure is unavailable and counts against the
/// circuit breaker.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: Throttle,
    base_url: String,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(http_client, &ProviderPolicy::yahoo_default())
    }

    pub fn with_policy(http_client: Arc<dyn HttpClient>, policy: &ProviderPolicy) -> Self {
        Self {
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(
                policy.provider_id,
                policy.circuit,
            )),
            throttle: Throttle::from_policy(policy),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Points the adapter at a different host, e.g. a recording proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    fn chart_url(&self, request: &HistoryRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            urlencoding::encode(request.symbol.as_str()),
            request.period,
            request.interval
        )
    }

    async fn fetch_chart(&self, request: &HistoryRequest) -> Result<PriceHistory, SourceError> {
        let symbol = &request.symbol;

        if !self.circuit_breaker.allow_request() {
            return Err(SourceError::unavailable(
                "yahoo circuit breaker is open; skipping upstream call",
            ));
        }

        if let Err(wait) = self.throttle.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "local yahoo quota exhausted for {symbol}; next slot in {}ms",
                wait.as_millis()
            )));
        }

        let http_request = HttpRequest::get(self.chart_url(request))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http_client
            .execute(http_request)
            .await
            .map_err(|e| {
                self.circuit_breaker.record_failure();
                SourceError::unavailable(format!("yahoo transport failed: {e}"))
            })?;

        debug!(symbol = %symbol, status = response.status, "yahoo chart response");

        if response.is_rate_limited() {
            self.circuit_breaker.record_success();
            return Err(SourceError::rate_limited(format!(
                "Too Many Requests for {symbol}"
            )));
        }
        if response.is_not_found() {
            self.circuit_breaker.record_success();
            return Err(SourceError::no_data(format!(
                "yahoo has no chart for {symbol}"
            )));
        }
        if !response.is_success() {
            self.circuit_breaker.record_failure();
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        self.circuit_breaker.record_success();
        parse_chart(symbol, &response.body)
    }
}

impl HistoryProvider for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_history<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_chart(request))
    }

    fn health(&self) -> HealthState {
        self.circuit_breaker.state().health()
    }
}

/// Turns a chart payload into rows. A chart with bars but no close column is a
/// missing field; null entries inside the column stay `None` rows.
fn parse_chart(symbol: &QualifiedSymbol, body: &str) -> Result<PriceHistory, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::no_data(format!("malformed yahoo chart for {symbol}: {e}"))
    })?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::no_data(format!(
            "yahoo chart error for {symbol}: {}",
            error.describe()
        )));
    }

    let Some(result) = response.chart.result.and_then(|results| results.into_iter().next()) else {
        return Err(SourceError::no_data(format!(
            "yahoo chart for {symbol} has no result"
        )));
    };

    let currency = result.meta.and_then(|meta| meta.currency);
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .and_then(|indicators| indicators.quote.into_iter().next())
        .and_then(|quote| quote.close);

    let closes = match closes {
        Some(closes) => closes,
        None if timestamps.is_empty() => Vec::new(),
        None => {
            return Err(SourceError::missing_field(format!(
                "yahoo chart for {symbol} has no close column"
            )))
        }
    };

    let rows = timestamps
        .iter()
        .enumerate()
        .filter_map(|(index, &seconds)| {
            let ts = UtcDateTime::from_unix_timestamp(seconds).ok()?;
            Some(HistoryRow::new(ts, closes.get(index).copied().flatten()))
        })
        .collect();

    Ok(PriceHistory::new(symbol.clone(), currency, rows))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => String::from("unknown error"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<YahooChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}
