//! Upstream provider contract and request/response types.
//!
//! The pipeline talks to market data through [`HistoryProvider`]: one call,
//! one symbol, a short window of closes back. Adapters translate their
//! transport failures into a [`SourceError`] whose [`SourceErrorKind`] drives
//! the retry decision, so classification never depends on message text.
//!
//! # Example
//!
//! ```rust,ignore
//! use optimus_core::{HistoryProvider, HistoryRequest, Market, Symbol};
//!
//! async fn latest(provider: &dyn HistoryProvider) {
//!     let symbol = Market::b3().qualify(&Symbol::parse("PETR4").unwrap());
//!     let history = provider.fetch_history(&HistoryRequest::new(symbol)).await;
//!     println!("{history:?}");
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::{Interval, Period, PriceHistory, ProviderId, QualifiedSymbol};

/// Health state reported by `status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl Display for HealthState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Upstream (or the local quota) refused the call for now.
    RateLimited,
    /// The call succeeded but carried no usable rows.
    NoData,
    /// Rows came back without the close column.
    MissingField,
    /// Transport failure, open circuit or unexpected upstream status.
    Unavailable,
}

/// Structured source error consumed by the retry controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn missing_field(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MissingField,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::MissingField => "source.missing_field",
            SourceErrorKind::Unavailable => "source.unavailable",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for a history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: QualifiedSymbol,
    pub period: Period,
    pub interval: Interval,
}

impl HistoryRequest {
    /// Two daily bars: enough for price and previous close.
    pub fn new(symbol: QualifiedSymbol) -> Self {
        Self::with_range(symbol, Period::default(), Interval::default())
    }

    pub fn with_range(symbol: QualifiedSymbol, period: Period, interval: Interval) -> Self {
        Self {
            symbol,
            period,
            interval,
        }
    }
}

/// Upstream adapter contract.
///
/// Implementations must be `Send + Sync`; the service shares one provider
/// across every in-flight request.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`id`](HistoryProvider::id) | Provider identifier, used as the quote `source` |
/// | [`fetch_history`](HistoryProvider::fetch_history) | One upstream call |
/// | [`health`](HistoryProvider::health) | Current health snapshot |
pub trait HistoryProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Performs exactly one upstream call. Retrying is the caller's job.
    fn fetch_history<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>>;

    fn health(&self) -> HealthState {
        HealthState::Healthy
    }
}
