//! Data records produced by the momentum pipeline.

use crate::momentum::error::SkipReason;
use crate::types::MarketCapTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical per-token metrics, derived from one raw row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetrics {
    pub name: String,
    /// Position of the source row among the data rows
    pub row_index: usize,
    pub market_cap: f64,
    pub tier: MarketCapTier,
    /// Log-compressed turnover, `ln(1 + %supply traded)`
    pub turnover: f64,
    /// Volume / market cap, in percent
    pub hype_activity: f64,
    /// `hype_activity / 100`
    pub vmr: f64,
    pub volatility: f64,
    pub mcap_change_24h: f64,
    pub price_change_24h: f64,
    /// Zero when the source has no 7d column
    pub price_change_7d: f64,
    /// Heuristic proxy derived from the volume/market-cap ratio
    pub volume_change_24h: f64,
    /// Coarse three-level proxy: 1.0, 0.5 or 0.3
    pub price_volume_correlation: f64,
}

/// Outlier detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    Iqr,
    #[serde(rename = "zscore")]
    ZScore,
    Hybrid,
}

/// Result of analyzing one metric across a tier population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierAnalysis {
    /// Values above the upper adaptive bound
    pub outliers: Vec<f64>,
    /// Positional outlier flags, same length as the input
    pub outlier_mask: Vec<bool>,
    /// Normalized scores in [0, 1]
    pub normalized: Vec<f64>,
    /// Rank scores in [0, 1], 1 for the highest value
    pub ranks: Vec<f64>,
}

impl OutlierAnalysis {
    /// Neutral result for populations too small for percentile statistics.
    pub fn neutral(len: usize) -> Self {
        Self {
            outliers: Vec::new(),
            outlier_mask: vec![false; len],
            normalized: vec![0.0; len],
            ranks: vec![0.0; len],
        }
    }

    pub fn is_outlier(&self, idx: usize) -> bool {
        self.outlier_mask.get(idx).copied().unwrap_or(false)
    }
}

/// Normalized per-metric scores kept for traceability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub mcap: f64,
    pub turnover: f64,
    pub hype: f64,
    pub price: f64,
    pub volume: f64,
    pub volatility: f64,
}

/// Momentum category combining score level and freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumType {
    #[serde(rename = "New Strong")]
    NewStrong,
    #[serde(rename = "Established Strong")]
    EstablishedStrong,
    #[serde(rename = "New Moderate")]
    NewModerate,
    #[serde(rename = "Established Moderate")]
    EstablishedModerate,
    Emerging,
    Fading,
}

impl MomentumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumType::NewStrong => "New Strong",
            MomentumType::EstablishedStrong => "Established Strong",
            MomentumType::NewModerate => "New Moderate",
            MomentumType::EstablishedModerate => "Established Moderate",
            MomentumType::Emerging => "Emerging",
            MomentumType::Fading => "Fading",
        }
    }
}

impl fmt::Display for MomentumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Strength bucket of the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MomentumStrength {
    #[serde(rename = "Very Weak")]
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    #[serde(rename = "Very Strong")]
    VeryStrong,
}

impl MomentumStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumStrength::VeryWeak => "Very Weak",
            MomentumStrength::Weak => "Weak",
            MomentumStrength::Moderate => "Moderate",
            MomentumStrength::Strong => "Strong",
            MomentumStrength::VeryStrong => "Very Strong",
        }
    }
}

impl fmt::Display for MomentumStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A token with its full score breakdown and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredToken {
    #[serde(flatten)]
    pub metrics: TokenMetrics,
    pub components: ComponentScores,
    pub base_score: f64,
    pub outlier_bonus: f64,
    pub rank_bonus: f64,
    pub correlation_bonus: f64,
    pub volatility_modifier: f64,
    pub raw_score: f64,
    /// Early momentum score after population rescale
    pub final_score: f64,
    pub duration_days: u32,
    pub momentum_type: MomentumType,
    pub momentum_strength: MomentumStrength,
    /// Flagged as an outlier on mcap change, turnover or hype
    pub is_outlier: bool,
}

/// A row that did not produce metrics, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row_index: usize,
    pub name: Option<String>,
    pub reason: SkipReason,
}

/// Outcome of extracting one tier's population from a payload.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub tokens: Vec<TokenMetrics>,
    pub skipped: Vec<SkippedRow>,
}

impl ExtractionReport {
    /// Skipped rows that indicate bad data rather than tier filtering.
    pub fn anomalies(&self) -> impl Iterator<Item = &SkippedRow> {
        self.skipped.iter().filter(|s| s.reason.is_anomaly())
    }
}

/// Caller-facing result of one tier pass.
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: MarketCapTier,
    pub generated_at: DateTime<Utc>,
    /// Tokens in the tier population before filtering
    pub population: usize,
    /// Rows skipped for data problems (tier mismatches excluded)
    pub skipped: usize,
    /// Filtered tokens, sorted by final score descending
    pub tokens: Vec<ScoredToken>,
}

impl TierReport {
    pub fn empty(tier: MarketCapTier) -> Self {
        Self {
            tier,
            generated_at: Utc::now(),
            population: 0,
            skipped: 0,
            tokens: Vec::new(),
        }
    }
}
