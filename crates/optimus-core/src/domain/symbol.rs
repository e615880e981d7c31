use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Normalized market symbol/ticker, as the caller asked for it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Provider-facing symbol after the market suffix transform.
///
/// This is also the cache key, so `petr4`, `PETR4` and `PETR4.SA` all share one
/// entry under the B3 market.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedSymbol(String);

impl QualifiedSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for QualifiedSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QualifiedSymbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Market conventions: provider suffix and default quote currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    name: &'static str,
    suffix: Option<&'static str>,
    default_currency: &'static str,
    max_bare_len: usize,
}

impl Market {
    /// Brazilian B3 exchange: `PETR4` is looked up as `PETR4.SA`, priced in BRL.
    pub const fn b3() -> Self {
        Self {
            name: "b3",
            suffix: Some(".SA"),
            default_currency: "BRL",
            max_bare_len: 6,
        }
    }

    /// US listings need no suffix.
    pub const fn us() -> Self {
        Self {
            name: "us",
            suffix: None,
            default_currency: "USD",
            max_bare_len: MAX_SYMBOL_LEN,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn default_currency(&self) -> &'static str {
        self.default_currency
    }

    /// Appends the market suffix unless the symbol already carries it or is too
    /// long to be a bare ticker of this market.
    pub fn qualify(&self, symbol: &Symbol) -> QualifiedSymbol {
        let raw = symbol.as_str();
        match self.suffix {
            Some(suffix) if !raw.ends_with(suffix) && raw.len() <= self.max_bare_len => {
                QualifiedSymbol(format!("{raw}{suffix}"))
            }
            _ => QualifiedSymbol(raw.to_owned()),
        }
    }

    /// Inverse of [`Market::qualify`], used for static per-ticker lookups.
    pub fn bare<'a>(&self, symbol: &'a Symbol) -> &'a str {
        let raw = symbol.as_str();
        self.suffix
            .and_then(|suffix| raw.strip_suffix(suffix))
            .unwrap_or(raw)
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::b3()
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "b3" | "br" | "sa" => Ok(Self::b3()),
            "us" => Ok(Self::us()),
            other => Err(ValidationError::InvalidMarket {
                value: other.to_owned(),
            }),
        }
    }
}
