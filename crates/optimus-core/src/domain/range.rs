use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::ValidationError;

/// Bar size requested from the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
}

impl Interval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::OneWeek => "1wk",
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::OneDay
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Self::OneHour),
            "1d" => Ok(Self::OneDay),
            "1wk" => Ok(Self::OneWeek),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}

/// Lookback window requested from the history endpoint.
///
/// Two daily bars are enough to derive price and previous close; longer
/// windows help across weekends and holidays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "2d")]
    TwoDays,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::TwoDays => "2d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::TwoDays
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "2d" => Ok(Self::TwoDays),
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            other => Err(ValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}
