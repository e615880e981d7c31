use thiserror::Error;

/// Validation errors raised while constructing domain values or configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or digit: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1h, 1d, 1wk")]
    InvalidInterval { value: String },
    #[error("invalid period '{value}', expected one of 1d, 2d, 5d, 1mo")]
    InvalidPeriod { value: String },
    #[error("invalid market '{value}', expected one of b3, us")]
    InvalidMarket { value: String },
    #[error("invalid fetch mode '{value}', expected one of strict, fallback")]
    InvalidFetchMode { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("configuration value for {key} is invalid: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

/// Failure surfaced by the quote pipeline to its callers.
///
/// Every upstream-related variant names the symbol that failed, so batch callers
/// can report `"SYMBOL: message"` lines and single-symbol callers get the symbol
/// back alongside a readable message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuoteError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("too many symbols requested: {requested} exceeds the maximum of {max}")]
    TooManyRequested { requested: usize, max: usize },

    #[error("rate limit exceeded for {symbol} after {attempts} attempts")]
    RetryExhausted { symbol: String, attempts: u32 },

    #[error("no data found for {symbol} after {attempts} attempts")]
    NoData { symbol: String, attempts: u32 },

    #[error("{field} price not available for {symbol}")]
    MissingField { symbol: String, field: &'static str },

    #[error("upstream unavailable for {symbol}: {message}")]
    UpstreamUnavailable { symbol: String, message: String },

    #[error("invalid quote for {symbol}: {reason}")]
    InvalidQuote {
        symbol: String,
        reason: ValidationError,
    },
}

impl QuoteError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Symbol the failure belongs to, when it is tied to one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { .. } | Self::TooManyRequested { .. } => None,
            Self::RetryExhausted { symbol, .. }
            | Self::NoData { symbol, .. }
            | Self::MissingField { symbol, .. }
            | Self::UpstreamUnavailable { symbol, .. }
            | Self::InvalidQuote { symbol, .. } => Some(symbol),
        }
    }

    /// True for failures caused by the upstream provider or its data, as opposed
    /// to rejected caller input. Only these are eligible for synthetic fallback.
    pub const fn is_upstream(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRequest { .. } | Self::TooManyRequested { .. }
        )
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "quote.invalid_request",
            Self::TooManyRequested { .. } => "quote.too_many_requested",
            Self::RetryExhausted { .. } => "quote.rate_limited",
            Self::NoData { .. } => "quote.no_data",
            Self::MissingField { .. } => "quote.missing_field",
            Self::UpstreamUnavailable { .. } => "quote.upstream_unavailable",
            Self::InvalidQuote { .. } => "quote.invalid_quote",
        }
    }
}

impl From<ValidationError> for QuoteError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}
