//! Batch request validation and aggregation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Quote, QuoteError};

/// Aggregated outcome of a multi-symbol request.
///
/// `results` is keyed by normalized symbol; a symbol requested twice keeps
/// the later quote, so `total_successful` counts distinct symbols. Each quote
/// carries the symbol as it was requested, even when served from the cache
/// under another spelling. `errors` serializes as `null` when every symbol
/// succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub results: BTreeMap<String, Quote>,
    pub total_requested: usize,
    pub total_successful: usize,
    pub errors: Option<Vec<String>>,
}

impl BatchResult {
    /// Folds per-symbol outcomes, in request order, into a result.
    pub fn from_outcomes<I>(total_requested: usize, outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<Quote, QuoteError>)>,
    {
        let mut results = BTreeMap::new();
        let mut errors = Vec::new();

        for (label, outcome) in outcomes {
            match outcome {
                Ok(quote) => {
                    results.insert(label, quote);
                }
                Err(error) => errors.push(format!("{label}: {error}")),
            }
        }

        Self {
            total_successful: results.len(),
            results,
            total_requested,
            errors: (!errors.is_empty()).then_some(errors),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.as_ref().map_or(0, Vec::len)
    }
}

/// Trims inputs, drops blanks and enforces the batch ceiling.
///
/// Runs before any upstream work, so an oversized batch costs nothing.
pub fn prepare_symbols<S: AsRef<str>>(
    raw: &[S],
    max_symbols: usize,
) -> Result<Vec<String>, QuoteError> {
    let symbols = raw
        .iter()
        .map(|value| value.as_ref().trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect::<Vec<_>>();

    if symbols.is_empty() {
        return Err(QuoteError::invalid_request(
            "at least one symbol is required",
        ));
    }

    if symbols.len() > max_symbols {
        return Err(QuoteError::TooManyRequested {
            requested: symbols.len(),
            max: max_symbols,
        });
    }

    Ok(symbols)
}
