//! Momentum scorer - combines per-metric statistics into final tier scores.
//!
//! Scoring is a pure batch pass over one tier population: per-metric outlier
//! analysis, a weighted base score with additive bonuses, then a
//! population-level rescale into a bounded final score.

use crate::momentum::config::{MomentumConfig, TierProfile};
use crate::momentum::duration::estimate_momentum_duration;
use crate::momentum::robust_stats::{detect_outliers, winsorize};
use crate::momentum::types::{
    ComponentScores, MomentumStrength, MomentumType, OutlierAnalysis, ScoredToken, TokenMetrics,
};
use crate::types::MarketCapTier;
use tracing::{debug, info, instrument};

/// Raw-score spread below which the population is rescaled with a logistic
/// curve instead of fixed rank buckets.
const MIN_RANK_SPREAD: f64 = 0.3;
const SIGMOID_STEEPNESS: f64 = 10.0;
const SIGMOID_FLOOR: f64 = 0.2;
const SIGMOID_SPAN: f64 = 0.75;
const TOP_OUTLIER_BONUS: f64 = 0.05;
const SCORE_CEILING: f64 = 0.98;
const TOP_RANK_SCORES: [f64; 3] = [0.95, 0.92, 0.89];
const TOP_DECILE_BASE: f64 = 0.85;
const TOP_DECILE_STEP: f64 = 0.01;
const TAIL_BASE: f64 = 0.8;
const TAIL_SLOPE: f64 = 0.6;
const TAIL_FLOOR: f64 = 0.2;

/// Outlier analyses of every scored metric over one population.
#[derive(Debug, Clone)]
pub struct PopulationAnalysis {
    pub mcap: OutlierAnalysis,
    pub turnover: OutlierAnalysis,
    pub hype: OutlierAnalysis,
    pub price: OutlierAnalysis,
    pub volume: OutlierAnalysis,
    pub volatility: OutlierAnalysis,
}

/// Score components of one token before the population rescale.
#[derive(Debug, Clone, Default, PartialEq)]
struct RawBreakdown {
    components: ComponentScores,
    base_score: f64,
    outlier_bonus: f64,
    rank_bonus: f64,
    correlation_bonus: f64,
    volatility_modifier: f64,
    raw_score: f64,
    is_outlier: bool,
}

/// Tier scorer driven by an explicit [`MomentumConfig`].
#[derive(Debug, Clone, Default)]
pub struct MomentumScorer {
    config: MomentumConfig,
}

impl MomentumScorer {
    pub fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }

    /// Run outlier detection on every metric of the population.
    pub fn analyze_population(&self, tier: MarketCapTier, tokens: &[TokenMetrics]) -> PopulationAnalysis {
        let params = &self.config.scoring;
        let sensitivity = self.config.profile(tier).sensitivity;
        let analyze = |values: Vec<f64>| {
            detect_outliers(&values, params.outlier_method, params.outlier_threshold, sensitivity)
        };

        let (winsor_lower, winsor_upper) = params.winsor_limits;
        let turnovers: Vec<f64> = tokens.iter().map(|t| t.turnover).collect();

        PopulationAnalysis {
            mcap: analyze(tokens.iter().map(|t| t.mcap_change_24h.max(0.0)).collect()),
            turnover: analyze(winsorize(&turnovers, winsor_lower, winsor_upper)),
            hype: analyze(tokens.iter().map(|t| t.hype_activity).collect()),
            price: analyze(tokens.iter().map(|t| t.price_change_24h.max(0.0)).collect()),
            volume: analyze(tokens.iter().map(|t| t.volume_change_24h.max(0.0)).collect()),
            volatility: analyze(tokens.iter().map(|t| t.volatility).collect()),
        }
    }

    /// Score every token of a tier population.
    ///
    /// Returns all tokens, unfiltered, ordered by raw score descending. The
    /// intermediate raw score is left uncapped; the rescale absorbs it.
    #[instrument(skip(self, tokens), fields(population = tokens.len()))]
    pub fn score_population(&self, tier: MarketCapTier, tokens: Vec<TokenMetrics>) -> Vec<ScoredToken> {
        if tokens.is_empty() {
            debug!("Empty population, nothing to score");
            return Vec::new();
        }

        let profile = self.config.profile(tier);
        let analysis = self.analyze_population(tier, &tokens);

        let breakdowns: Vec<RawBreakdown> = tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| self.raw_breakdown(profile, &analysis, idx, token))
            .collect();

        let mut order: Vec<usize> = (0..tokens.len()).collect();
        order.sort_by(|&a, &b| breakdowns[b].raw_score.total_cmp(&breakdowns[a].raw_score));

        let sorted_raw: Vec<f64> = order.iter().map(|&i| breakdowns[i].raw_score).collect();
        let sorted_outliers: Vec<bool> = order.iter().map(|&i| breakdowns[i].is_outlier).collect();
        let finals = rescale_scores(&sorted_raw, &sorted_outliers);

        let mut slots: Vec<Option<(TokenMetrics, RawBreakdown)>> =
            tokens.into_iter().zip(breakdowns).map(Some).collect();

        let scored: Vec<ScoredToken> = order
            .iter()
            .zip(finals)
            .filter_map(|(&idx, final_score)| {
                let (metrics, b) = slots[idx].take()?;
                let duration_days = estimate_momentum_duration(&metrics, final_score);
                Some(ScoredToken {
                    metrics,
                    components: b.components,
                    base_score: b.base_score,
                    outlier_bonus: b.outlier_bonus,
                    rank_bonus: b.rank_bonus,
                    correlation_bonus: b.correlation_bonus,
                    volatility_modifier: b.volatility_modifier,
                    raw_score: b.raw_score,
                    final_score,
                    duration_days,
                    momentum_type: MomentumType::classify(final_score, duration_days),
                    momentum_strength: MomentumStrength::from_score(final_score),
                    is_outlier: b.is_outlier,
                })
            })
            .collect();

        if let Some(top) = scored.first() {
            debug!(
                "Top {} token {} raw={:.3} final={:.3}",
                tier, top.metrics.name, top.raw_score, top.final_score
            );
        }
        scored
    }

    /// Score a population and keep only positive-mcap-change tokens above the
    /// score floor, best first.
    #[instrument(skip(self, tokens), fields(population = tokens.len()))]
    pub fn rank_population(&self, tier: MarketCapTier, tokens: Vec<TokenMetrics>) -> Vec<ScoredToken> {
        let scored = self.score_population(tier, tokens);
        let population = scored.len();
        let ranked = filter_and_sort(scored, self.config.scoring.min_final_score);
        info!("{}: {} of {} tokens show early momentum", tier, ranked.len(), population);
        ranked
    }

    fn raw_breakdown(
        &self,
        profile: &TierProfile,
        analysis: &PopulationAnalysis,
        idx: usize,
        token: &TokenMetrics,
    ) -> RawBreakdown {
        let params = &self.config.scoring;
        let weights = &profile.weights;

        let components = ComponentScores {
            mcap: analysis.mcap.normalized[idx],
            turnover: analysis.turnover.normalized[idx],
            hype: analysis.hype.normalized[idx],
            price: analysis.price.normalized[idx],
            volume: analysis.volume.normalized[idx],
            volatility: analysis.volatility.normalized[idx],
        };

        let base_score = weights.mcap_change * components.mcap
            + weights.turnover * components.turnover
            + weights.hype * components.hype
            + weights.price * components.price
            + weights.volume * components.volume
            + weights.volatility * components.volatility;

        let flagged = [
            (analysis.mcap.is_outlier(idx), params.mcap_outlier_bonus),
            (analysis.turnover.is_outlier(idx), params.turnover_outlier_bonus),
            (analysis.hype.is_outlier(idx), params.hype_outlier_bonus),
        ];
        let outlier_bonus: f64 = flagged.iter().filter(|(hit, _)| *hit).map(|(_, b)| b).sum();
        let is_outlier = flagged.iter().any(|(hit, _)| *hit);

        let top_ranks = [&analysis.mcap, &analysis.turnover, &analysis.hype]
            .iter()
            .filter(|a| a.ranks[idx] > params.rank_bonus_threshold)
            .count();
        let rank_bonus = (top_ranks as f64 * params.rank_bonus_step).min(params.rank_bonus_cap);

        let correlation_bonus = params.correlation_bonus_factor * token.price_volume_correlation;
        let volatility_modifier = profile.volatility.modifier(token.volatility);

        let raw_score = base_score + outlier_bonus + rank_bonus + correlation_bonus + volatility_modifier;

        RawBreakdown {
            components,
            base_score,
            outlier_bonus,
            rank_bonus,
            correlation_bonus,
            volatility_modifier,
            raw_score,
            is_outlier,
        }
    }
}

/// Map raw scores (sorted descending) to bounded final scores.
///
/// A spread below 0.3 goes through a logistic curve centered on the
/// population midpoint and compressed into [0.2, 0.95], with a +0.05 lift
/// (capped at 0.98) for top-3 outliers. Wider spreads use fixed rank
/// buckets.
pub fn rescale_scores(raw_desc: &[f64], outlier_flags: &[bool]) -> Vec<f64> {
    let n = raw_desc.len();
    if n == 0 {
        return Vec::new();
    }

    let max_raw = raw_desc[0];
    let min_raw = if n > 1 { raw_desc[n - 1] } else { 0.0 };
    let range = max_raw - min_raw;

    if range < MIN_RANK_SPREAD {
        return raw_desc
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let position = if range > 0.0 { (raw - min_raw) / range } else { 0.5 };
                let sigmoid = 1.0 / (1.0 + (-SIGMOID_STEEPNESS * (position - 0.5)).exp());
                let mut score = SIGMOID_FLOOR + sigmoid * SIGMOID_SPAN;
                if i < TOP_RANK_SCORES.len() && outlier_flags.get(i).copied().unwrap_or(false) {
                    score = (score + TOP_OUTLIER_BONUS).min(SCORE_CEILING);
                }
                score
            })
            .collect();
    }

    (0..n)
        .map(|i| {
            if let Some(&fixed) = TOP_RANK_SCORES.get(i) {
                fixed
            } else if (i as f64) < n as f64 * 0.1 {
                TOP_DECILE_BASE - i as f64 * TOP_DECILE_STEP
            } else {
                let rank_position = i as f64 / n as f64;
                (TAIL_BASE - rank_position * TAIL_SLOPE).max(TAIL_FLOOR)
            }
        })
        .collect()
}

/// Keep tokens with positive 24h mcap change and `final_score >= min_score`,
/// sorted by final score descending.
pub fn filter_and_sort(tokens: Vec<ScoredToken>, min_score: f64) -> Vec<ScoredToken> {
    let mut kept: Vec<ScoredToken> = tokens
        .into_iter()
        .filter(|t| t.metrics.mcap_change_24h > 0.0 && t.final_score >= min_score)
        .collect();
    kept.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str, mcap_change: f64) -> TokenMetrics {
        TokenMetrics {
            name: name.to_string(),
            row_index: 0,
            market_cap: 2e10,
            tier: MarketCapTier::Large,
            turnover: 2.0,
            hype_activity: 4.0,
            vmr: 0.04,
            volatility: 5.0,
            mcap_change_24h: mcap_change,
            price_change_24h: 2.0,
            price_change_7d: 6.0,
            volume_change_24h: 0.0,
            price_volume_correlation: 0.5,
        }
    }

    #[test]
    fn test_spike_token_wins_large_tier() {
        let changes = [1.0, 2.0, 3.0, 4.0, 500.0, 5.0, 1.5, 2.5, 3.5, 4.5];
        let tokens: Vec<_> = changes
            .iter()
            .enumerate()
            .map(|(i, c)| token(&format!("T{i}"), *c))
            .collect();

        let scorer = MomentumScorer::default();
        let ranked = scorer.rank_population(MarketCapTier::Large, tokens);

        assert_eq!(ranked[0].metrics.name, "T4");
        assert!(ranked[0].is_outlier);
        assert!((ranked[0].outlier_bonus - 0.10).abs() < 1e-12);
        assert!(ranked[1..].iter().all(|t| !t.is_outlier));
    }

    #[test]
    fn test_components_are_traceable() {
        let tokens: Vec<_> = (0..6).map(|i| token(&format!("T{i}"), 1.0 + i as f64)).collect();
        let scored = MomentumScorer::default().score_population(MarketCapTier::Large, tokens);

        for t in &scored {
            let sum = t.base_score + t.outlier_bonus + t.rank_bonus + t.correlation_bonus + t.volatility_modifier;
            assert!((t.raw_score - sum).abs() < 1e-12);
            // identical volatility of 5 sits in the large-cap ideal band
            assert_eq!(t.volatility_modifier, 0.05);
            assert!((t.correlation_bonus - 0.015).abs() < 1e-12);
            assert!(t.rank_bonus <= 0.10);
        }
        // raw order is descending
        assert!(scored.windows(2).all(|w| w[0].raw_score >= w[1].raw_score));
    }

    #[test]
    fn test_rank_bonus_is_capped() {
        let mut tokens: Vec<_> = (0..10).map(|i| token(&format!("T{i}"), 1.0 + i as f64)).collect();
        for (i, t) in tokens.iter_mut().enumerate() {
            t.turnover = 1.0 + i as f64;
            t.hype_activity = 1.0 + i as f64;
        }
        let scored = MomentumScorer::default().score_population(MarketCapTier::Large, tokens);
        let top = scored.iter().find(|t| t.metrics.name == "T9").unwrap();
        // three top ranks at 0.03 each would be 0.09, under the 0.10 cap
        assert!((top.rank_bonus - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_small_population_still_scores() {
        let tokens = vec![token("A", 3.0), token("B", 1.0)];
        let scored = MomentumScorer::default().score_population(MarketCapTier::Large, tokens);
        assert_eq!(scored.len(), 2);
        // neutral statistics: only correlation and volatility terms remain
        assert!(scored.iter().all(|t| t.base_score == 0.0 && !t.is_outlier));
        assert!(scored.iter().all(|t| (0.2..=0.98).contains(&t.final_score)));
    }

    #[test]
    fn test_empty_population() {
        let scorer = MomentumScorer::default();
        assert!(scorer.score_population(MarketCapTier::Mid, Vec::new()).is_empty());
        assert!(scorer.rank_population(MarketCapTier::Mid, Vec::new()).is_empty());
    }

    #[test]
    fn test_rescale_rank_buckets() {
        let raw: Vec<f64> = (0..20).map(|i| 1.0 - i as f64 * 0.05).collect();
        let finals = rescale_scores(&raw, &vec![false; 20]);

        assert_eq!(&finals[..3], &[0.95, 0.92, 0.89]);
        // top decile of 20 is positions 0 and 1; position 3 is already tail
        assert!((finals[3] - (0.8 - 0.6 * 3.0 / 20.0)).abs() < 1e-12);
        assert!((finals[19] - 0.23).abs() < 1e-12);
    }

    #[test]
    fn test_rescale_top_decile_on_large_population() {
        let raw: Vec<f64> = (0..50).map(|i| 2.0 - i as f64 * 0.02).collect();
        let finals = rescale_scores(&raw, &vec![false; 50]);
        assert!((finals[3] - 0.82).abs() < 1e-12);
        assert!((finals[4] - 0.81).abs() < 1e-12);
        assert!((finals[5] - (0.8 - 0.6 * 0.1)).abs() < 1e-12);
        assert!(finals.iter().all(|f| *f >= 0.2));
    }

    #[test]
    fn test_rescale_sigmoid_path() {
        let raw = [0.50, 0.49, 0.48, 0.47, 0.46];
        let finals = rescale_scores(&raw, &[false; 5]);

        assert!(finals[0] > 0.9 && finals[0] <= 0.95);
        assert!(finals[4] >= 0.2 && finals[4] < 0.21);
        assert!((finals[2] - 0.575).abs() < 1e-12);
        assert!(finals.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_rescale_sigmoid_outlier_lift() {
        let raw = [0.50, 0.49, 0.48, 0.47];
        let plain = rescale_scores(&raw, &[false; 4]);
        let lifted = rescale_scores(&raw, &[true, false, true, true]);

        assert!((lifted[0] - (plain[0] + 0.05).min(0.98)).abs() < 1e-12);
        assert_eq!(lifted[1], plain[1]);
        assert!((lifted[2] - (plain[2] + 0.05)).abs() < 1e-12);
        // fourth place gets no lift
        assert_eq!(lifted[3], plain[3]);
    }

    #[test]
    fn test_rescale_identical_scores() {
        let finals = rescale_scores(&[0.4, 0.4, 0.4], &[false; 3]);
        assert!(finals.iter().all(|f| (f - 0.575).abs() < 1e-12));
    }

    #[test]
    fn test_filter_drops_non_positive_mcap_change() {
        let tokens: Vec<_> = [5.0, 0.0, -3.0, 2.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, c)| token(&format!("T{i}"), *c))
            .collect();
        let ranked = MomentumScorer::default().rank_population(MarketCapTier::Large, tokens);

        assert!(ranked.iter().all(|t| t.metrics.mcap_change_24h > 0.0));
        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].final_score >= w[1].final_score));
    }
}
