//! Robust statistics over a tier population.
//!
//! Percentiles, winsorization, rank normalization and adaptive outlier
//! detection. Everything here is pure: slice in, vectors out.

use crate::momentum::types::{OutlierAnalysis, OutlierMethod};

/// Smallest population for which percentile statistics are computed.
pub const MIN_POPULATION: usize = 4;

/// Share of the IQR-normalized score in the hybrid blend; ranks get the rest.
const HYBRID_IQR_WEIGHT: f64 = 0.7;

/// Percentile with linear interpolation between closest ranks.
/// `pct` is in [0, 100]. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let lo = sorted[idx];
    let hi = sorted[(idx + 1).min(sorted.len() - 1)];
    Some(lo + (hi - lo) * frac)
}

/// Clamp every value into `[P(lower), P(1 - upper)]` of the same slice.
/// `lower` and `upper` are tail fractions (0.05 clips 5% on each side).
/// Populations below [`MIN_POPULATION`] come back unchanged.
pub fn winsorize(values: &[f64], lower: f64, upper: f64) -> Vec<f64> {
    if values.len() < MIN_POPULATION {
        return values.to_vec();
    }
    let (Some(lo), Some(hi)) = (
        percentile(values, lower * 100.0),
        percentile(values, (1.0 - upper) * 100.0),
    ) else {
        return values.to_vec();
    };
    values.iter().map(|v| v.max(lo).min(hi)).collect()
}

/// Rank scores: 1.0 for the highest value, linearly spaced down to 0.0 for
/// the lowest. Ties keep input order. A single value ranks 1.0.
pub fn rank_normalize(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0.0; n];
    let denom = (n - 1) as f64;
    for (position, &idx) in order.iter().enumerate() {
        ranks[idx] = 1.0 - position as f64 / denom;
    }
    ranks
}

/// Detect upper-tail outliers and produce normalized and rank scores.
///
/// `threshold` is scaled by `1 / sensitivity`, so a sensitivity above 1
/// tightens the bounds and bends the normalization curve toward 1. Only
/// values above the upper bound are ever flagged.
pub fn detect_outliers(
    values: &[f64],
    method: OutlierMethod,
    threshold: f64,
    sensitivity: f64,
) -> OutlierAnalysis {
    if values.len() < MIN_POPULATION {
        return OutlierAnalysis::neutral(values.len());
    }

    let ranks = rank_normalize(values);

    match method {
        OutlierMethod::Iqr => {
            let (mask, normalized) = iqr_scores(values, threshold, sensitivity);
            build(values, mask, normalized, ranks)
        }
        OutlierMethod::Hybrid => {
            let (mask, iqr_normalized) = iqr_scores(values, threshold, sensitivity);
            let normalized = iqr_normalized
                .iter()
                .zip(&ranks)
                .map(|(n, r)| HYBRID_IQR_WEIGHT * n + (1.0 - HYBRID_IQR_WEIGHT) * r)
                .collect();
            build(values, mask, normalized, ranks)
        }
        OutlierMethod::ZScore => {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

            if !std.is_finite() || std <= f64::EPSILON {
                return OutlierAnalysis {
                    ranks,
                    ..OutlierAnalysis::neutral(values.len())
                };
            }

            let adjusted = threshold / sensitivity;
            let zscores: Vec<f64> = values.iter().map(|v| (v - mean) / std).collect();
            let mask = zscores.iter().map(|z| *z > adjusted).collect();
            let normalized = zscores
                .iter()
                .map(|&z| {
                    let score = if z <= 0.0 {
                        0.5 * (sensitivity * z).exp()
                    } else {
                        0.5 + 0.5 * (1.0 - (-sensitivity * z).exp())
                    };
                    score.clamp(0.0, 1.0)
                })
                .collect();
            build(values, mask, normalized, ranks)
        }
    }
}

fn iqr_scores(values: &[f64], threshold: f64, sensitivity: f64) -> (Vec<bool>, Vec<f64>) {
    let q1 = percentile(values, 25.0).unwrap_or(0.0);
    let q3 = percentile(values, 75.0).unwrap_or(0.0);
    let iqr = q3 - q1;

    let adjusted = threshold / sensitivity;
    let lower = q1 - adjusted * iqr;
    let upper = q3 + adjusted * iqr;

    let mask = values.iter().map(|v| *v > upper).collect();
    let normalized = values
        .iter()
        .map(|&v| {
            if v <= lower {
                0.0
            } else if v >= upper {
                1.0
            } else {
                // bounds overflow to infinity at extreme magnitudes
                let position = (v - lower) / (upper - lower);
                if position.is_finite() {
                    position.powf(1.0 / sensitivity).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
        })
        .collect();

    (mask, normalized)
}

fn build(values: &[f64], mask: Vec<bool>, normalized: Vec<f64>, ranks: Vec<f64>) -> OutlierAnalysis {
    let outliers = values
        .iter()
        .zip(&mask)
        .filter(|(_, flagged)| **flagged)
        .map(|(v, _)| *v)
        .collect();
    OutlierAnalysis {
        outliers,
        outlier_mask: mask,
        normalized,
        ranks,
    }
}
