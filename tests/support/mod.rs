//! Shared test doubles for the integration suites.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use optimus_core::{
    Backoff, FetchMode, FixedRandom, HealthState, HistoryProvider, HistoryRequest, HistoryRow,
    HttpClient, HttpError, HttpRequest, HttpResponse, ManualClock, PriceHistory, ProviderId,
    QuoteService, ServiceConfig, SourceError, UtcDateTime,
};
use tokio::time::Instant;

pub const START: &str = "2024-03-15T14:00:00Z";

pub fn start_time() -> UtcDateTime {
    UtcDateTime::parse(START).expect("valid start time")
}

/// One scripted upstream answer.
#[derive(Debug, Clone)]
pub enum Step {
    Closes(Vec<f64>),
    ClosesIn(&'static str, Vec<f64>),
    Empty,
    MissingClose,
    RateLimited,
    NoData,
    Unavailable,
}

impl Step {
    fn answer(&self, request: &HistoryRequest) -> Result<PriceHistory, SourceError> {
        let symbol = request.symbol.clone();
        let rows = |closes: &[Option<f64>]| {
            closes
                .iter()
                .enumerate()
                .map(|(day, close)| {
                    HistoryRow::new(
                        start_time().saturating_add(Duration::from_secs(86_400 * day as u64)),
                        *close,
                    )
                })
                .collect::<Vec<_>>()
        };

        match self {
            Self::Closes(closes) => Ok(PriceHistory::new(
                symbol,
                None,
                rows(&closes.iter().copied().map(Some).collect::<Vec<_>>()),
            )),
            Self::ClosesIn(currency, closes) => Ok(PriceHistory::new(
                symbol,
                Some((*currency).to_owned()),
                rows(&closes.iter().copied().map(Some).collect::<Vec<_>>()),
            )),
            Self::Empty => Ok(PriceHistory::empty(symbol)),
            Self::MissingClose => Ok(PriceHistory::new(symbol, None, rows(&[None, None]))),
            Self::RateLimited => Err(SourceError::rate_limited(format!(
                "Too Many Requests for {}",
                request.symbol
            ))),
            Self::NoData => Err(SourceError::no_data(format!(
                "no chart for {}",
                request.symbol
            ))),
            Self::Unavailable => Err(SourceError::unavailable("connection refused")),
        }
    }
}

/// Provider answering from per-symbol scripts and counting every call.
///
/// A script's last step repeats once the script runs out. Symbols without a
/// script answer with `default_step`. Each answer's tokio time is recorded.
#[derive(Debug)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    default_step: Step,
    latency: Duration,
    calls: AtomicUsize,
    calls_by_symbol: Mutex<HashMap<String, usize>>,
    answered_at: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ScriptedProvider {
    pub fn new(default_step: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_step,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            calls_by_symbol: Mutex::new(HashMap::new()),
            answered_at: Mutex::new(HashMap::new()),
        }
    }

    /// Every symbol trades at 37.90 then 38.45.
    pub fn healthy() -> Self {
        Self::new(Step::Closes(vec![37.90, 38.45]))
    }

    pub fn with_script(self, qualified: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .expect("scripts lock")
            .insert(qualified.to_owned(), steps.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, qualified: &str) -> usize {
        self.calls_by_symbol
            .lock()
            .expect("calls lock")
            .get(qualified)
            .copied()
            .unwrap_or(0)
    }

    /// When each call for `qualified` returned, in call order.
    pub fn answered_at(&self, qualified: &str) -> Vec<Instant> {
        self.answered_at
            .lock()
            .expect("answers lock")
            .get(qualified)
            .cloned()
            .unwrap_or_default()
    }

    fn next_step(&self, qualified: &str) -> Step {
        let mut scripts = self.scripts.lock().expect("scripts lock");
        match scripts.get_mut(qualified) {
            Some(steps) if steps.len() > 1 => steps.pop_front().expect("non-empty script"),
            Some(steps) => steps.front().cloned().unwrap_or_else(|| self.default_step.clone()),
            None => self.default_step.clone(),
        }
    }
}

impl HistoryProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_history<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_symbol
            .lock()
            .expect("calls lock")
            .entry(request.symbol.as_str().to_owned())
            .or_insert(0) += 1;
        let step = self.next_step(request.symbol.as_str());

        Box::pin(async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.answered_at
                .lock()
                .expect("answers lock")
                .entry(request.symbol.as_str().to_owned())
                .or_default()
                .push(Instant::now());
            step.answer(request)
        })
    }

    fn health(&self) -> HealthState {
        HealthState::Healthy
    }
}

/// Service over a scripted provider with a manual clock and jitter pinned to zero.
pub fn service_with(
    provider: Arc<ScriptedProvider>,
    config: ServiceConfig,
) -> (QuoteService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = QuoteService::builder()
        .config(config)
        .provider(provider)
        .clock(clock.clone())
        .random(Arc::new(FixedRandom(0.0)))
        .backoff(Backoff::default())
        .build();
    (service, clock)
}

pub fn strict_service(provider: Arc<ScriptedProvider>) -> (QuoteService, Arc<ManualClock>) {
    service_with(provider, ServiceConfig::default())
}

pub fn fallback_service(provider: Arc<ScriptedProvider>) -> (QuoteService, Arc<ManualClock>) {
    service_with(
        provider,
        ServiceConfig::default().with_fetch_mode(FetchMode::Fallback),
    )
}

/// HTTP double replaying canned responses and recording every request.
///
/// The last response repeats once the queue runs out.
#[derive(Debug)]
pub struct RecordingHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: Result<HttpResponse, HttpError>) -> Self {
        Self::new(vec![response])
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("requests lock").push(request);
        let response = {
            let mut responses = self.responses.lock().expect("responses lock");
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        }
        .unwrap_or_else(|| Err(HttpError::new("no scripted response")));

        Box::pin(async move { response })
    }
}

/// Minimal Yahoo v8 chart body with one close per day.
pub fn chart_body(currency: &str, closes: &[f64]) -> String {
    let start = start_time().unix_timestamp();
    let timestamps = (0..closes.len())
        .map(|day| (start + 86_400 * day as i64).to_string())
        .collect::<Vec<_>>()
        .join(",");
    let closes = closes
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"{{"chart":{{"result":[{{"meta":{{"currency":"{currency}"}},"timestamp":[{timestamps}],"indicators":{{"quote":[{{"close":[{closes}]}}]}}}}],"error":null}}}}"#
    )
}
