//! Synthetic quotes for degraded mode.

use std::sync::Arc;

use crate::clock::Clock;
use crate::random::RandomSource;
use crate::{Market, Quote, QuoteSource, Symbol};

/// Base price for tickers missing from the table.
pub const DEFAULT_BASE_PRICE: f64 = 25.00;

/// Maximum relative deviation from the base price.
pub const MAX_VARIATION: f64 = 0.02;

const B3_BASE_PRICES: &[(&str, f64)] = &[
    ("PETR4", 38.50),
    ("PETR3", 40.10),
    ("VALE3", 62.30),
    ("ITUB4", 33.10),
    ("BBDC4", 14.20),
    ("ABEV3", 12.80),
    ("BBAS3", 27.40),
    ("WEGE3", 52.60),
    ("MGLU3", 2.15),
    ("B3SA3", 11.90),
    ("RENT3", 41.70),
    ("SUZB3", 56.20),
];

/// Produces a plausible quote without touching the upstream.
///
/// `price = base * (1 + u)` with `u` uniform in `[-2%, +2%]` and
/// `previousClose = base`, so `|changePercent| <= 2` always holds.
#[derive(Clone)]
pub struct FallbackGenerator {
    market: Market,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl FallbackGenerator {
    pub fn new(market: Market, clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            market,
            clock,
            random,
        }
    }

    pub fn base_price(&self, symbol: &Symbol) -> f64 {
        let bare = self.market.bare(symbol);
        B3_BASE_PRICES
            .iter()
            .find(|(ticker, _)| *ticker == bare)
            .map_or(DEFAULT_BASE_PRICE, |(_, price)| *price)
    }

    pub fn generate(&self, symbol: &Symbol) -> Quote {
        let base = self.base_price(symbol);
        let variation = self.random.uniform(-MAX_VARIATION, MAX_VARIATION);
        let price = base * (1.0 + variation);
        let now = self.clock.now();
        let currency = self.market.default_currency();

        Quote::from_closes(
            symbol.clone(),
            price,
            Some(base),
            currency,
            now,
            QuoteSource::Synthetic,
        )
        .unwrap_or_else(|_| Quote::synthetic_flat(symbol.clone(), base, currency, now))
    }
}

impl std::fmt::Debug for FallbackGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackGenerator")
            .field("market", &self.market)
            .finish_non_exhaustive()
    }
}
