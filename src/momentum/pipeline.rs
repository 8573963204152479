//! Batch entry points: one tier, or all four tiers concurrently.

use crate::momentum::metrics::extract_tier;
use crate::momentum::scorer::MomentumScorer;
use crate::momentum::types::TierReport;
use crate::types::{MarketCapTier, SheetPayload};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Detect early momentum within one tier of a sheet snapshot.
///
/// Never fails: missing data yields an empty report, bad rows are skipped
/// and counted.
#[instrument(skip(payload, scorer))]
pub fn detect_early_momentum(
    payload: &SheetPayload,
    tier: MarketCapTier,
    scorer: &MomentumScorer,
) -> TierReport {
    if payload.is_empty() {
        warn!("No valid data available for analysis");
        return TierReport::empty(tier);
    }

    let extraction = extract_tier(payload, tier);
    let skipped = extraction.anomalies().count();
    let population = extraction.tokens.len();

    if population == 0 {
        info!("No {} tokens in snapshot", tier);
        return TierReport {
            skipped,
            ..TierReport::empty(tier)
        };
    }

    let tokens = scorer.rank_population(tier, extraction.tokens);

    TierReport {
        tier,
        generated_at: Utc::now(),
        population,
        skipped,
        tokens,
    }
}

/// Score all four tiers concurrently, one blocking task per tier.
/// Reports come back in tier order, largest first.
#[instrument(skip(payload, scorer), fields(rows = payload.rows().len()))]
pub async fn analyze_all_tiers(
    payload: Arc<SheetPayload>,
    scorer: Arc<MomentumScorer>,
) -> Result<Vec<TierReport>> {
    let handles: Vec<_> = MarketCapTier::all()
        .into_iter()
        .map(|tier| {
            let payload = Arc::clone(&payload);
            let scorer = Arc::clone(&scorer);
            (
                tier,
                tokio::task::spawn_blocking(move || detect_early_momentum(&payload, tier, &scorer)),
            )
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (tier, handle) in handles {
        let report = handle
            .await
            .with_context(|| format!("{tier} scoring task failed"))?;
        reports.push(report);
    }

    info!(
        "Scored {} tiers, {} tokens with early momentum",
        reports.len(),
        reports.iter().map(|r| r.tokens.len()).sum::<usize>()
    );
    Ok(reports)
}
