//! # Domain Models
//!
//! Canonical domain types for the quote pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Normalized quote with derived change fields |
//! | [`Symbol`] | Validated, uppercase caller symbol |
//! | [`Market`] | Suffix and currency conventions of a listing venue |
//! | [`QualifiedSymbol`] | Provider-facing symbol, also the cache key |
//! | [`PriceHistory`] | Raw provider rows awaiting normalization |
//! | [`Period`] / [`Interval`] | History request window and bar size |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Construction validates invariants: symbols are uppercase ASCII, prices are
//! finite and non-negative, currencies are 3-letter codes.

mod history;
mod quote;
mod range;
mod symbol;
mod timestamp;

pub use history::{HistoryRow, PriceHistory};
pub use quote::{round_money, validate_currency_code, Quote};
pub use range::{Interval, Period};
pub use symbol::{Market, QualifiedSymbol, Symbol};
pub use timestamp::UtcDateTime;
