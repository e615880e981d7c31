//! # Optimus Core
//!
//! Quote retrieval for Optimus: a symbol goes in, a normalized quote or a
//! structured error comes out, with as few upstream calls as possible.
//!
//! ## Overview
//!
//! - **TTL cache** keyed by provider-qualified symbol, with per-key refresh guards
//! - **Retry controller** with exponential backoff and additive jitter
//! - **Quote normalizer** turning raw closes into a canonical [`Quote`]
//! - **Fallback generator** for synthetic quotes in degraded mode
//! - **Batch orchestration** with per-symbol failure isolation
//! - **Yahoo chart adapter** guarded by a circuit breaker and a local quota
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Upstream adapters (Yahoo) |
//! | [`batch`] | Batch validation and [`BatchResult`] |
//! | [`cache`] | TTL cache and cache modes |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`clock`] | Injectable time source |
//! | [`config`] | [`ServiceConfig`] and environment loading |
//! | [`data_source`] | Provider trait and source errors |
//! | [`domain`] | Domain models (Quote, Symbol, Market, PriceHistory) |
//! | [`error`] | Validation and quote errors |
//! | [`fallback`] | Synthetic quote generator |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`normalizer`] | History to quote conversion |
//! | [`provider_policy`] | Per-provider client-side limits |
//! | [`random`] | Injectable randomness |
//! | [`retry`] | Backoff and retry controller |
//! | [`service`] | [`QuoteService`], the public entry point |
//! | [`source`] | Provider and provenance identifiers |
//! | [`throttling`] | Local rate limiting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use optimus_core::QuoteService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = QuoteService::from_env()?;
//!
//!     let quote = service.get_quote("PETR4").await?;
//!     println!("{} {:.2} {}", quote.symbol(), quote.price(), quote.currency());
//!
//!     let batch = service.get_quotes(&["VALE3", "ITUB4"]).await?;
//!     println!("{} of {} ok", batch.total_successful, batch.total_requested);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  QuoteService   │────▶│ TTL Cache        │
//! │  (batch fan-out)│     └──────────────────┘
//! │                 │     ┌──────────────────┐
//! │                 │────▶│ FallbackGenerator│  upstream error,
//! └────────┬────────┘     └──────────────────┘  never cached
//!          │ miss / stale
//!          ▼
//! ┌─────────────────┐
//! │ RetryController │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HistoryProvider │────▶│ Circuit Breaker  │
//! │ (YahooAdapter)  │     │ + Throttle       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ QuoteNormalizer │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapters report a [`SourceError`]. The retry controller retries it while
//! `retryable()` holds and turns it into a [`QuoteError`] by kind:
//!
//! ```rust
//! use optimus_core::{SourceError, SourceErrorKind};
//!
//! let throttled = SourceError::rate_limited("429");
//! assert!(throttled.retryable());
//!
//! let no_close = SourceError::missing_field("chart has no close column");
//! assert_eq!(no_close.kind(), SourceErrorKind::MissingField);
//! assert!(!no_close.retryable());
//! assert!(!SourceError::unavailable("connection refused").retryable());
//! ```

pub mod adapters;
pub mod batch;
pub mod cache;
pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod normalizer;
pub mod provider_policy;
pub mod random;
pub mod retry;
pub mod service;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::YahooAdapter;

// Batch
pub use batch::BatchResult;

// Caching
pub use cache::{CacheEntryStatus, CacheMode, CacheSnapshot, CachedQuote, QuoteCache};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Injected clock and randomness
pub use clock::{Clock, ManualClock, SystemClock};
pub use random::{FastrandSource, FixedRandom, RandomSource};

// Configuration
pub use config::{FetchMode, ServiceConfig};

// Provider contract
pub use data_source::{HealthState, HistoryProvider, HistoryRequest, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    round_money, validate_currency_code, HistoryRow, Interval, Market, Period, PriceHistory,
    QualifiedSymbol, Quote, Symbol, UtcDateTime,
};

// Error types
pub use error::{QuoteError, ValidationError};

// Pipeline stages
pub use fallback::FallbackGenerator;
pub use normalizer::QuoteNormalizer;
pub use retry::{Backoff, RetryController};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Provider policies
pub use provider_policy::ProviderPolicy;

// Service entry point
pub use service::{ClearReport, QuoteService, QuoteServiceBuilder, ServiceStatus};

// Source identifiers
pub use source::{ProviderId, QuoteSource};

// Throttling
pub use throttling::Throttle;
