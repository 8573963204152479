//! Tier-keyed scoring configuration.
//!
//! The sensitivity map, weight tables and volatility bands are explicit
//! tables keyed by [`MarketCapTier`] and handed to the scorer, so a JSON file
//! can override any of them without touching the scoring code.

use crate::momentum::types::OutlierMethod;
use crate::types::MarketCapTier;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Weight of each normalized metric in the base score. Sums to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub mcap_change: f64,
    pub turnover: f64,
    pub hype: f64,
    pub price: f64,
    pub volume: f64,
    pub volatility: f64,
}

impl MetricWeights {
    pub fn total(&self) -> f64 {
        self.mcap_change + self.turnover + self.hype + self.price + self.volume + self.volatility
    }

    fn values(&self) -> [f64; 6] {
        [
            self.mcap_change,
            self.turnover,
            self.hype,
            self.price,
            self.volume,
            self.volatility,
        ]
    }
}

/// Volatility bands and the additive modifier of each band.
///
/// `[ideal_min, ideal_max]` earns `ideal_bonus`, `(ideal_max, acceptable_max]`
/// earns `acceptable_bonus`, `(acceptable_max, high_max]` adds `high_modifier`
/// and anything above `high_max` adds `extreme_modifier`. Below `ideal_min`
/// the modifier is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityBands {
    pub ideal_min: f64,
    pub ideal_max: f64,
    pub ideal_bonus: f64,
    pub acceptable_max: f64,
    pub acceptable_bonus: f64,
    pub high_max: f64,
    pub high_modifier: f64,
    pub extreme_modifier: f64,
}

impl VolatilityBands {
    /// Additive score modifier for a volatility reading.
    pub fn modifier(&self, volatility: f64) -> f64 {
        if volatility < self.ideal_min {
            0.0
        } else if volatility <= self.ideal_max {
            self.ideal_bonus
        } else if volatility <= self.acceptable_max {
            self.acceptable_bonus
        } else if volatility <= self.high_max {
            self.high_modifier
        } else {
            self.extreme_modifier
        }
    }

    fn is_ordered(&self) -> bool {
        self.ideal_min <= self.ideal_max
            && self.ideal_max <= self.acceptable_max
            && self.acceptable_max <= self.high_max
    }
}

/// Everything that differs between tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    /// Outlier sensitivity; smaller, more volatile tiers get amplified values
    pub sensitivity: f64,
    pub weights: MetricWeights,
    pub volatility: VolatilityBands,
}

impl TierProfile {
    pub fn default_for(tier: MarketCapTier) -> Self {
        match tier {
            MarketCapTier::Large => Self {
                sensitivity: 1.0,
                weights: MetricWeights {
                    mcap_change: 0.25,
                    turnover: 0.20,
                    hype: 0.25,
                    price: 0.10,
                    volume: 0.10,
                    volatility: 0.10,
                },
                volatility: VolatilityBands {
                    ideal_min: 2.0,
                    ideal_max: 10.0,
                    ideal_bonus: 0.05,
                    acceptable_max: 20.0,
                    acceptable_bonus: 0.02,
                    high_max: 40.0,
                    high_modifier: -0.03,
                    extreme_modifier: -0.08,
                },
            },
            MarketCapTier::Mid => Self {
                sensitivity: 1.2,
                weights: MetricWeights {
                    mcap_change: 0.20,
                    turnover: 0.20,
                    hype: 0.30,
                    price: 0.10,
                    volume: 0.10,
                    volatility: 0.10,
                },
                volatility: VolatilityBands {
                    ideal_min: 3.0,
                    ideal_max: 15.0,
                    ideal_bonus: 0.05,
                    acceptable_max: 30.0,
                    acceptable_bonus: 0.02,
                    high_max: 50.0,
                    high_modifier: -0.03,
                    extreme_modifier: -0.07,
                },
            },
            MarketCapTier::Small => Self {
                sensitivity: 1.5,
                weights: MetricWeights {
                    mcap_change: 0.15,
                    turnover: 0.20,
                    hype: 0.30,
                    price: 0.15,
                    volume: 0.10,
                    volatility: 0.10,
                },
                volatility: small_cap_bands(),
            },
            MarketCapTier::Micro => Self {
                sensitivity: 2.0,
                weights: MetricWeights {
                    mcap_change: 0.15,
                    turnover: 0.15,
                    hype: 0.35,
                    price: 0.15,
                    volume: 0.10,
                    volatility: 0.10,
                },
                volatility: small_cap_bands(),
            },
        }
    }
}

// Small and micro caps share one band table.
fn small_cap_bands() -> VolatilityBands {
    VolatilityBands {
        ideal_min: 5.0,
        ideal_max: 25.0,
        ideal_bonus: 0.05,
        acceptable_max: 40.0,
        acceptable_bonus: 0.02,
        high_max: 60.0,
        high_modifier: -0.02,
        extreme_modifier: -0.06,
    }
}

/// Tier-independent scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub outlier_method: OutlierMethod,
    pub outlier_threshold: f64,
    /// Lower and upper tail fractions clipped from turnover
    pub winsor_limits: (f64, f64),
    pub mcap_outlier_bonus: f64,
    pub turnover_outlier_bonus: f64,
    pub hype_outlier_bonus: f64,
    /// Rank above which a metric counts as top-tier
    pub rank_bonus_threshold: f64,
    pub rank_bonus_step: f64,
    pub rank_bonus_cap: f64,
    pub correlation_bonus_factor: f64,
    /// Minimum final score kept in the output
    pub min_final_score: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            outlier_method: OutlierMethod::Hybrid,
            outlier_threshold: 1.5,
            winsor_limits: (0.05, 0.05),
            mcap_outlier_bonus: 0.10,
            turnover_outlier_bonus: 0.07,
            hype_outlier_bonus: 0.07,
            rank_bonus_threshold: 0.85,
            rank_bonus_step: 0.03,
            rank_bonus_cap: 0.10,
            correlation_bonus_factor: 0.03,
            min_final_score: 0.15,
        }
    }
}

/// Complete scoring configuration.
///
/// Deserializes as an override: absent tier sections, and absent fields
/// within a tier section, keep that tier's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigOverride")]
pub struct MomentumConfig {
    #[serde(rename = "largeCap")]
    pub large: TierProfile,
    #[serde(rename = "midCap")]
    pub mid: TierProfile,
    #[serde(rename = "smallCap")]
    pub small: TierProfile,
    #[serde(rename = "microCap")]
    pub micro: TierProfile,
    pub scoring: ScoringParams,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            large: TierProfile::default_for(MarketCapTier::Large),
            mid: TierProfile::default_for(MarketCapTier::Mid),
            small: TierProfile::default_for(MarketCapTier::Small),
            micro: TierProfile::default_for(MarketCapTier::Micro),
            scoring: ScoringParams::default(),
        }
    }
}

/// Per-tier fields that an override file may set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TierOverride {
    sensitivity: Option<f64>,
    weights: Option<MetricWeights>,
    volatility: Option<VolatilityBands>,
}

impl TierOverride {
    fn apply(self, tier: MarketCapTier) -> TierProfile {
        let defaults = TierProfile::default_for(tier);
        TierProfile {
            sensitivity: self.sensitivity.unwrap_or(defaults.sensitivity),
            weights: self.weights.unwrap_or(defaults.weights),
            volatility: self.volatility.unwrap_or(defaults.volatility),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigOverride {
    #[serde(rename = "largeCap")]
    large: TierOverride,
    #[serde(rename = "midCap")]
    mid: TierOverride,
    #[serde(rename = "smallCap")]
    small: TierOverride,
    #[serde(rename = "microCap")]
    micro: TierOverride,
    scoring: ScoringParams,
}

impl From<ConfigOverride> for MomentumConfig {
    fn from(file: ConfigOverride) -> Self {
        Self {
            large: file.large.apply(MarketCapTier::Large),
            mid: file.mid.apply(MarketCapTier::Mid),
            small: file.small.apply(MarketCapTier::Small),
            micro: file.micro.apply(MarketCapTier::Micro),
            scoring: file.scoring,
        }
    }
}

impl MomentumConfig {
    pub fn profile(&self, tier: MarketCapTier) -> &TierProfile {
        match tier {
            MarketCapTier::Large => &self.large,
            MarketCapTier::Mid => &self.mid,
            MarketCapTier::Small => &self.small,
            MarketCapTier::Micro => &self.micro,
        }
    }

    /// Load a JSON override file. Missing sections and tier fields keep
    /// their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.validate()?;
        info!("Loaded momentum config from {}", path.display());
        Ok(config)
    }

    /// Reject settings that would break the statistics; warn on weight tables
    /// that do not sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        for tier in MarketCapTier::all() {
            let profile = self.profile(tier);

            if !(profile.sensitivity.is_finite() && profile.sensitivity > 0.0) {
                bail!("{tier}: sensitivity must be positive, got {}", profile.sensitivity);
            }
            if profile.weights.values().iter().any(|w| !w.is_finite() || *w < 0.0) {
                bail!("{tier}: weights must be non-negative");
            }
            if !profile.volatility.is_ordered() {
                bail!("{tier}: volatility bands must be ascending");
            }

            let total = profile.weights.total();
            if (total - 1.0).abs() > 1e-6 {
                warn!("{tier}: weights sum to {:.4}, expected 1.0", total);
            }
        }

        let (lower, upper) = self.scoring.winsor_limits;
        if !(0.0..0.5).contains(&lower) || !(0.0..0.5).contains(&upper) {
            bail!("winsor limits must lie in [0, 0.5), got ({lower}, {upper})");
        }
        if !(self.scoring.outlier_threshold.is_finite() && self.scoring.outlier_threshold > 0.0) {
            bail!("outlier threshold must be positive");
        }

        Ok(())
    }
}
