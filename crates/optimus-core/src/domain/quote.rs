use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{QuoteSource, Symbol, UtcDateTime, ValidationError};

const MONEY_DECIMALS: u32 = 2;

/// Canonical quote record.
///
/// `change`, `change_percent` and `is_mocked` are derived at construction and
/// cannot be set independently. Monetary fields are rounded with
/// [`round_money`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    symbol: Symbol,
    price: f64,
    previous_close: f64,
    change: f64,
    change_percent: f64,
    currency: String,
    timestamp: UtcDateTime,
    source: QuoteSource,
    is_mocked: bool,
}

impl Quote {
    /// Derives a quote from the latest close and, when known, the close before it.
    ///
    /// A missing previous close means a flat quote (zero change). A previous
    /// close of zero yields `change_percent == 0`.
    pub fn from_closes(
        symbol: Symbol,
        price: f64,
        previous_close: Option<f64>,
        currency: impl AsRef<str>,
        timestamp: UtcDateTime,
        source: QuoteSource,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        let previous_close = previous_close.unwrap_or(price);
        validate_non_negative("previous_close", previous_close)?;

        let change = price - previous_close;
        let change_percent = if previous_close == 0.0 {
            0.0
        } else {
            change / previous_close * 100.0
        };

        Ok(Self {
            symbol,
            price: round_money(price),
            previous_close: round_money(previous_close),
            change: round_money(change),
            change_percent: round_money(change_percent),
            currency: validate_currency_code(currency.as_ref())?,
            timestamp,
            source,
            is_mocked: source.is_synthetic(),
        })
    }

    /// Zero-change synthetic quote. Callers pass a finite, non-negative price
    /// and an already validated currency.
    pub(crate) fn synthetic_flat(
        symbol: Symbol,
        price: f64,
        currency: &str,
        timestamp: UtcDateTime,
    ) -> Self {
        let price = round_money(price);
        Self {
            symbol,
            price,
            previous_close: price,
            change: 0.0,
            change_percent: 0.0,
            currency: currency.to_owned(),
            timestamp,
            source: QuoteSource::Synthetic,
            is_mocked: true,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Same quote under another spelling of the ticker.
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn previous_close(&self) -> f64 {
        self.previous_close
    }

    pub fn change(&self) -> f64 {
        self.change
    }

    pub fn change_percent(&self) -> f64 {
        self.change_percent
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn timestamp(&self) -> UtcDateTime {
        self.timestamp
    }

    pub fn source(&self) -> QuoteSource {
        self.source
    }

    pub fn is_mocked(&self) -> bool {
        self.is_mocked
    }
}

/// Rounds to 2 decimal places, half away from zero, on the value's shortest
/// decimal representation.
///
/// `38.455` rounds to `38.46` even though its binary approximation sits just
/// below the midpoint; `38.4549` rounds to `38.45`.
pub fn round_money(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .map(|decimal| {
            decimal.round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        })
        .and_then(|decimal| decimal.to_string().parse::<f64>().ok())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderId;

    fn quote(price: f64, previous_close: Option<f64>) -> Result<Quote, ValidationError> {
        Quote::from_closes(
            Symbol::parse("PETR4").expect("valid"),
            price,
            previous_close,
            "brl",
            UtcDateTime::parse("2024-01-01T00:00:00Z").expect("timestamp"),
            QuoteSource::Provider(ProviderId::Yahoo),
        )
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(38.4549), 38.45);
        assert_eq!(round_money(38.455), 38.46);
        assert_eq!(round_money(-1.005), -1.01);
        assert_eq!(round_money(2.0), 2.0);
    }

    #[test]
    fn derives_change_from_previous_close() {
        let quote = quote(38.45, Some(37.90)).expect("valid quote");

        assert_eq!(quote.price(), 38.45);
        assert_eq!(quote.previous_close(), 37.90);
        assert_eq!(quote.change(), 0.55);
        assert_eq!(quote.change_percent(), 1.45);
        assert_eq!(quote.currency(), "BRL");
        assert!(!quote.is_mocked());
    }

    #[test]
    fn missing_previous_close_means_flat_quote() {
        let quote = quote(12.3, None).expect("valid quote");
        assert_eq!(quote.previous_close(), 12.3);
        assert_eq!(quote.change(), 0.0);
        assert_eq!(quote.change_percent(), 0.0);
    }

    #[test]
    fn zero_previous_close_never_divides() {
        let quote = quote(5.0, Some(0.0)).expect("valid quote");
        assert_eq!(quote.change(), 5.0);
        assert_eq!(quote.change_percent(), 0.0);
    }

    #[test]
    fn rejects_negative_and_non_finite_prices() {
        assert!(matches!(
            quote(-1.0, None),
            Err(ValidationError::NegativeValue { field: "price" })
        ));
        assert!(matches!(
            quote(f64::NAN, None),
            Err(ValidationError::NonFiniteValue { field: "price" })
        ));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(quote(10.0, Some(8.0)).expect("valid")).expect("json");

        assert_eq!(value["symbol"], "PETR4");
        assert_eq!(value["previousClose"], 8.0);
        assert_eq!(value["changePercent"], 25.0);
        assert_eq!(value["source"], "yahoo");
        assert_eq!(value["isMocked"], false);
        assert_eq!(value["timestamp"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn validates_currency() {
        assert_eq!(
            validate_currency_code("usd").expect("must normalize"),
            "USD"
        );
        assert!(matches!(
            validate_currency_code("USDT"),
            Err(ValidationError::InvalidCurrency { .. })
        ));
    }
}
