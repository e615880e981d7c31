//! Raw provider history to canonical [`Quote`].

use std::sync::Arc;

use crate::clock::Clock;
use crate::{validate_currency_code, Market, PriceHistory, Quote, QuoteError, QuoteSource, Symbol};

/// Converts raw provider output into a canonical quote record.
#[derive(Clone)]
pub struct QuoteNormalizer {
    market: Market,
    clock: Arc<dyn Clock>,
}

impl QuoteNormalizer {
    pub fn new(market: Market, clock: Arc<dyn Clock>) -> Self {
        Self { market, clock }
    }

    /// `price` is the most recent usable close and `previousClose` the one
    /// before it (or `price` when only one exists). The quote timestamp is
    /// the time of normalization.
    pub fn normalize(
        &self,
        symbol: &Symbol,
        history: &PriceHistory,
        source: QuoteSource,
    ) -> Result<Quote, QuoteError> {
        let mut closes = history.recent_closes();
        let Some(price) = closes.next() else {
            return Err(QuoteError::MissingField {
                symbol: symbol.to_string(),
                field: "close",
            });
        };
        let previous_close = closes.next();

        let currency = history
            .currency
            .as_deref()
            .and_then(|code| validate_currency_code(code).ok())
            .unwrap_or_else(|| self.market.default_currency().to_owned());

        Quote::from_closes(
            symbol.clone(),
            price,
            previous_close,
            currency,
            self.clock.now(),
            source,
        )
        .map_err(|reason| QuoteError::InvalidQuote {
            symbol: symbol.to_string(),
            reason,
        })
    }
}

impl std::fmt::Debug for QuoteNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteNormalizer")
            .field("market", &self.market)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::{HistoryRow, ProviderId, UtcDateTime};

    const YAHOO: QuoteSource = QuoteSource::Provider(ProviderId::Yahoo);

    fn normalizer() -> (QuoteNormalizer, UtcDateTime) {
        let now = UtcDateTime::parse("2024-05-10T18:00:00Z").expect("timestamp");
        let clock = Arc::new(ManualClock::new(now));
        (QuoteNormalizer::new(Market::b3(), clock), now)
    }

    fn history(currency: Option<&str>, closes: &[Option<f64>]) -> PriceHistory {
        let ts = UtcDateTime::parse("2024-05-09T00:00:00Z").expect("timestamp");
        let symbol = Market::b3().qualify(&Symbol::parse("PETR4").expect("valid"));
        PriceHistory::new(
            symbol,
            currency.map(str::to_owned),
            closes.iter().map(|close| HistoryRow::new(ts, *close)).collect(),
        )
    }

    #[test]
    fn uses_last_two_closes() {
        let (normalizer, now) = normalizer();
        let symbol = Symbol::parse("PETR4").expect("valid");

        let quote = normalizer
            .normalize(&symbol, &history(Some("BRL"), &[Some(37.1), Some(37.9), Some(38.45)]), YAHOO)
            .expect("normalize");

        assert_eq!(quote.price(), 38.45);
        assert_eq!(quote.previous_close(), 37.9);
        assert_eq!(quote.change(), 0.55);
        assert_eq!(quote.timestamp(), now);
        assert_eq!(quote.symbol().as_str(), "PETR4");
    }

    #[test]
    fn single_close_is_a_flat_quote() {
        let (normalizer, _) = normalizer();
        let symbol = Symbol::parse("VALE3").expect("valid");

        let quote = normalizer
            .normalize(&symbol, &history(None, &[Some(62.3)]), YAHOO)
            .expect("normalize");

        assert_eq!(quote.previous_close(), 62.3);
        assert_eq!(quote.change_percent(), 0.0);
        assert_eq!(quote.currency(), "BRL");
    }

    #[test]
    fn null_trailing_close_falls_back_to_earlier_rows() {
        let (normalizer, _) = normalizer();
        let symbol = Symbol::parse("ITUB4").expect("valid");

        let quote = normalizer
            .normalize(&symbol, &history(Some("usd"), &[Some(33.0), Some(33.1), None]), YAHOO)
            .expect("normalize");

        assert_eq!(quote.price(), 33.1);
        assert_eq!(quote.previous_close(), 33.0);
        assert_eq!(quote.currency(), "USD");
    }

    #[test]
    fn rows_without_closes_are_a_missing_field() {
        let (normalizer, _) = normalizer();
        let symbol = Symbol::parse("BBDC4").expect("valid");

        let error = normalizer
            .normalize(&symbol, &history(Some("BRL"), &[None, None]), YAHOO)
            .expect_err("must fail");

        assert_eq!(
            error.to_string(),
            "close price not available for BBDC4"
        );
    }

    #[test]
    fn unusable_currency_falls_back_to_market_default() {
        let (normalizer, _) = normalizer();
        let symbol = Symbol::parse("ABEV3").expect("valid");

        let quote = normalizer
            .normalize(&symbol, &history(Some("R$"), &[Some(12.8)]), YAHOO)
            .expect("normalize");

        assert_eq!(quote.currency(), "BRL");
    }
}
