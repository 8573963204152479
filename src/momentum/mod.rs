//! Early momentum scoring.
//!
//! Robust statistics, metric extraction, tier scoring and duration
//! classification, plus the batch pipeline that ties them together.

pub mod config;
pub mod duration;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod robust_stats;
pub mod scorer;
pub mod types;

// Re-export main types
pub use types::{
    ComponentScores, ExtractionReport, MomentumStrength, MomentumType, OutlierAnalysis,
    OutlierMethod, ScoredToken, SkippedRow, TierReport, TokenMetrics,
};

// Re-export key components
pub use config::{MetricWeights, MomentumConfig, ScoringParams, TierProfile, VolatilityBands};
pub use duration::estimate_momentum_duration;
pub use error::SkipReason;
pub use metrics::{extract_metrics, extract_tier, RawTokenRow};
pub use pipeline::{analyze_all_tiers, detect_early_momentum};
pub use robust_stats::{detect_outliers, rank_normalize, winsorize};
pub use scorer::{filter_and_sort, rescale_scores, MomentumScorer};
