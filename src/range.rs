//! Range and retention tokens.
//!
//! Retention tokens (`24h`, `7d`, `30d`) pick how long data is kept: `24h`
//! means the raw rolling log alone, the day-denominated tokens additionally
//! enable hourly archival with a 168h/720h summary ceiling. Range tokens
//! (`1h`..`30d`) select how much history a query covers.
//!
//! Range filtering is timestamp-based everywhere. Entry counts derived from
//! the sampling cadence are used only as storage-size caps, never as a
//! time-range semantic, so a drifting collector cadence cannot silently
//! stretch or shrink what a range label means.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuotawatchError;

/// How long collected data is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionPeriod {
    /// Raw rolling log only, no archival.
    #[serde(rename = "24h")]
    Day,
    /// Hourly summaries kept for 168 hours.
    #[serde(rename = "7d")]
    Week,
    /// Hourly summaries kept for 720 hours.
    #[serde(rename = "30d")]
    Month,
}

impl Default for RetentionPeriod {
    fn default() -> Self {
        RetentionPeriod::Week
    }
}

impl RetentionPeriod {
    pub fn hours(self) -> i64 {
        match self {
            RetentionPeriod::Day => 24,
            RetentionPeriod::Week => 168,
            RetentionPeriod::Month => 720,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RetentionPeriod::Day => "24h",
            RetentionPeriod::Week => "7d",
            RetentionPeriod::Month => "30d",
        }
    }
}

impl fmt::Display for RetentionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionPeriod {
    type Err = QuotawatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(RetentionPeriod::Day),
            "7d" => Ok(RetentionPeriod::Week),
            "30d" => Ok(RetentionPeriod::Month),
            other => Err(QuotawatchError::InvalidRange(format!(
                "unknown retention period '{}', expected 24h, 7d or 30d",
                other
            ))),
        }
    }
}

/// How much history a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeToken {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "30d")]
    D30,
}

impl RangeToken {
    pub fn hours(self) -> i64 {
        match self {
            RangeToken::H1 => 1,
            RangeToken::H6 => 6,
            RangeToken::H12 => 12,
            RangeToken::H24 => 24,
            RangeToken::D7 => 168,
            RangeToken::D30 => 720,
        }
    }

    /// Ranges longer than the raw window stitch in hourly summaries.
    pub fn spans_summaries(self) -> bool {
        self.hours() > 24
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RangeToken::H1 => "1h",
            RangeToken::H6 => "6h",
            RangeToken::H12 => "12h",
            RangeToken::H24 => "24h",
            RangeToken::D7 => "7d",
            RangeToken::D30 => "30d",
        }
    }
}

impl fmt::Display for RangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeToken {
    type Err = QuotawatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(RangeToken::H1),
            "6h" => Ok(RangeToken::H6),
            "12h" => Ok(RangeToken::H12),
            "24h" => Ok(RangeToken::H24),
            "7d" => Ok(RangeToken::D7),
            "30d" => Ok(RangeToken::D30),
            other => Err(QuotawatchError::InvalidRange(format!(
                "unknown range '{}', expected one of 1h, 6h, 12h, 24h, 7d, 30d",
                other
            ))),
        }
    }
}
