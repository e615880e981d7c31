use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::ValidationError;

/// Upstream providers the pipeline can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Yahoo,
}

impl ProviderId {
    pub const ALL: [Self; 1] = [Self::Yahoo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance tag carried by every quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteSource {
    /// Normalized from real upstream data.
    Provider(ProviderId),
    /// Produced by the fallback generator.
    Synthetic,
}

impl QuoteSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider(provider) => provider.as_str(),
            Self::Synthetic => "synthetic",
        }
    }

    pub const fn is_synthetic(self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

impl Display for QuoteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QuoteSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for QuoteSource {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "synthetic" => Ok(Self::Synthetic),
            other => ProviderId::ALL
                .into_iter()
                .find(|provider| provider.as_str() == other)
                .map(Self::Provider)
                .ok_or_else(|| ValidationError::InvalidConfig {
                    key: "source",
                    value: other.to_owned(),
                }),
        }
    }
}
