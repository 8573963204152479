//! Momentum age and type classification.
//!
//! Single-snapshot heuristics: the 24h/7d price change ratio stands in for
//! how much of a move happened recently. No trend is fitted.

use crate::momentum::types::{MomentumStrength, MomentumType, TokenMetrics};

/// Estimated momentum age in days, from 1 (fresh) to 7 (aged or over).
pub fn estimate_momentum_duration(metrics: &TokenMetrics, score: f64) -> u32 {
    let change_24h = metrics.price_change_24h;
    let change_7d = metrics.price_change_7d;

    if change_24h == 0.0 || change_7d == 0.0 {
        return if metrics.mcap_change_24h > 20.0 {
            1
        } else if metrics.mcap_change_24h > 10.0 || score > 0.8 {
            2
        } else {
            3
        };
    }

    match (change_24h > 0.0, change_7d > 0.0) {
        (true, true) => {
            // share of the weekly move that happened in the last day
            let ratio = change_24h / change_7d;
            if ratio > 0.9 {
                1
            } else if ratio > 0.7 {
                2
            } else if ratio > 0.5 {
                3
            } else if ratio > 0.3 {
                5
            } else {
                7
            }
        }
        // fresh reversal
        (true, false) => 1,
        (false, true) => {
            if score > 0.7 {
                6
            } else {
                7
            }
        }
        (false, false) => {
            if score > 0.7 {
                3
            } else {
                7
            }
        }
    }
}

impl MomentumType {
    /// Durations of two days or less count as new momentum.
    pub fn classify(score: f64, duration_days: u32) -> Self {
        let is_new = duration_days <= 2;
        if score >= 0.8 {
            if is_new {
                MomentumType::NewStrong
            } else {
                MomentumType::EstablishedStrong
            }
        } else if score >= 0.6 {
            if is_new {
                MomentumType::NewModerate
            } else {
                MomentumType::EstablishedModerate
            }
        } else if is_new {
            MomentumType::Emerging
        } else {
            MomentumType::Fading
        }
    }
}

impl MomentumStrength {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            MomentumStrength::VeryStrong
        } else if score >= 0.7 {
            MomentumStrength::Strong
        } else if score >= 0.5 {
            MomentumStrength::Moderate
        } else if score >= 0.3 {
            MomentumStrength::Weak
        } else {
            MomentumStrength::VeryWeak
        }
    }
}
