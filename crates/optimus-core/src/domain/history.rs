use crate::{QualifiedSymbol, UtcDateTime};

/// One observation from the upstream history endpoint.
///
/// `close` is `None` when the provider sent the row without a close value
/// (a missing column or a `null` cell).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRow {
    pub ts: UtcDateTime,
    pub close: Option<f64>,
}

impl HistoryRow {
    pub fn new(ts: UtcDateTime, close: Option<f64>) -> Self {
        Self { ts, close }
    }
}

/// Raw price history as returned by a provider, oldest row first.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub symbol: QualifiedSymbol,
    pub currency: Option<String>,
    pub rows: Vec<HistoryRow>,
}

impl PriceHistory {
    pub fn new(symbol: QualifiedSymbol, currency: Option<String>, rows: Vec<HistoryRow>) -> Self {
        Self {
            symbol,
            currency,
            rows,
        }
    }

    pub fn empty(symbol: QualifiedSymbol) -> Self {
        Self::new(symbol, None, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Usable closes, most recent first. Null, non-finite and negative values
    /// are skipped.
    pub fn recent_closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .rev()
            .filter_map(|row| row.close)
            .filter(|close| close.is_finite() && *close >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Market, Symbol};

    #[test]
    fn recent_closes_skip_unusable_values() {
        let symbol = Market::b3().qualify(&Symbol::parse("PETR4").expect("valid"));
        let ts = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("timestamp");
        let history = PriceHistory::new(
            symbol,
            None,
            vec![
                HistoryRow::new(ts, Some(37.5)),
                HistoryRow::new(ts, Some(f64::NAN)),
                HistoryRow::new(ts, Some(38.1)),
                HistoryRow::new(ts, None),
            ],
        );

        let closes = history.recent_closes().collect::<Vec<_>>();
        assert_eq!(closes, vec![38.1, 37.5]);
        assert_eq!(history.len(), 4);
    }
}
