//! Core types shared across the early momentum pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Market-capitalization tier. Every relative statistic is computed within a
/// single tier; tokens are never compared across tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCapTier {
    /// Above 10B USD
    #[serde(rename = "largeCap")]
    Large,
    /// Above 1B USD
    #[serde(rename = "midCap")]
    Mid,
    /// Above 100M USD
    #[serde(rename = "smallCap")]
    Small,
    /// Everything else
    #[serde(rename = "microCap")]
    Micro,
}

impl MarketCapTier {
    /// Tier assignment by fixed market-cap breakpoints.
    pub fn from_market_cap(market_cap: f64) -> Self {
        if market_cap > 10_000_000_000.0 {
            MarketCapTier::Large
        } else if market_cap > 1_000_000_000.0 {
            MarketCapTier::Mid
        } else if market_cap > 100_000_000.0 {
            MarketCapTier::Small
        } else {
            MarketCapTier::Micro
        }
    }

    /// Returns the upstream label for the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCapTier::Large => "largeCap",
            MarketCapTier::Mid => "midCap",
            MarketCapTier::Small => "smallCap",
            MarketCapTier::Micro => "microCap",
        }
    }

    /// Returns all tiers, largest first.
    pub fn all() -> [MarketCapTier; 4] {
        [
            MarketCapTier::Large,
            MarketCapTier::Mid,
            MarketCapTier::Small,
            MarketCapTier::Micro,
        ]
    }
}

impl fmt::Display for MarketCapTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MarketCapTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.trim_end_matches("cap") {
            "large" => Ok(MarketCapTier::Large),
            "mid" => Ok(MarketCapTier::Mid),
            "small" => Ok(MarketCapTier::Small),
            "micro" => Ok(MarketCapTier::Micro),
            _ => anyhow::bail!("unknown market cap tier: {s}"),
        }
    }
}

/// Sheet-shaped payload as returned by the upstream data source: the first
/// row is the header, every following row is one token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetPayload {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl SheetPayload {
    /// Build a payload from a header and string rows.
    pub fn from_rows(header: &[&str], rows: Vec<Vec<String>>) -> Self {
        let mut values = Vec::with_capacity(rows.len() + 1);
        values.push(header.iter().map(|h| Value::String(h.to_string())).collect());
        values.extend(
            rows.into_iter()
                .map(|row| row.into_iter().map(Value::String).collect()),
        );
        Self { values }
    }

    /// Column names of the header row, or `None` when the payload is empty.
    pub fn header(&self) -> Option<Vec<String>> {
        self.values
            .first()
            .map(|row| row.iter().map(cell_to_string).collect())
    }

    /// Data rows (everything after the header).
    pub fn rows(&self) -> &[Vec<Value>] {
        self.values.get(1..).unwrap_or(&[])
    }

    /// True when there is no header or no data row.
    pub fn is_empty(&self) -> bool {
        self.values.len() < 2
    }
}

/// Render a sheet cell as text. `null` becomes the empty string.
pub fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
