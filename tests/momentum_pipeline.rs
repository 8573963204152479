//! End-to-end tests for the early momentum pipeline

use early_momentum::momentum::{
    analyze_all_tiers, detect_early_momentum, detect_outliers, winsorize, MomentumScorer,
    OutlierMethod,
};
use early_momentum::{MarketCapTier, SheetPayload};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const HEADER: [&str; 9] = [
    "Tokens",
    "Market Cap",
    "Total Volume",
    "Circulating Supply",
    "Market Cap (Change 24h)",
    "Price Changes 24h",
    "Price Changes 7d",
    "Volatility 24h",
    "Hype Activity",
];

struct Row {
    name: String,
    market_cap: f64,
    volume: f64,
    supply: f64,
    mcap_change: f64,
    change_24h: f64,
    change_7d: f64,
    volatility: f64,
}

impl Row {
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.market_cap.to_string(),
            self.volume.to_string(),
            self.supply.to_string(),
            self.mcap_change.to_string(),
            self.change_24h.to_string(),
            self.change_7d.to_string(),
            self.volatility.to_string(),
            String::new(),
        ]
    }
}

fn payload(rows: &[Row]) -> SheetPayload {
    SheetPayload::from_rows(&HEADER, rows.iter().map(Row::cells).collect())
}

fn random_values(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.1) {
                rng.gen_range(50.0..500.0)
            } else {
                rng.gen_range(-10.0..10.0)
            }
        })
        .collect()
}

#[test]
fn test_normalized_scores_stay_in_unit_interval() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let len = rng.gen_range(4..40);
        let values = random_values(&mut rng, len);
        let sensitivity = rng.gen_range(0.5..2.5);

        for method in [OutlierMethod::Iqr, OutlierMethod::ZScore, OutlierMethod::Hybrid] {
            let result = detect_outliers(&values, method, 1.5, sensitivity);
            assert_eq!(result.normalized.len(), len);
            assert_eq!(result.ranks.len(), len);
            assert!(result.normalized.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(result.ranks.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}

#[test]
fn test_tiny_populations_are_neutral() {
    for len in 0..4 {
        let values: Vec<f64> = (0..len).map(|i| i as f64 * 100.0).collect();
        let result = detect_outliers(&values, OutlierMethod::Hybrid, 1.5, 2.0);
        assert_eq!(result.normalized, vec![0.0; len]);
        assert!(result.outliers.is_empty());
    }
}

#[test]
fn test_winsorize_bounds_and_order() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..100 {
        let len = rng.gen_range(4..60);
        let values = random_values(&mut rng, len);
        let out = winsorize(&values, 0.05, 0.05);

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let pct = |p: f64| {
            let pos = p * (len - 1) as f64;
            let idx = pos.floor() as usize;
            let hi = sorted[(idx + 1).min(len - 1)];
            sorted[idx] + (hi - sorted[idx]) * (pos - idx as f64)
        };
        let (p5, p95) = (pct(0.05), pct(0.95));

        assert_eq!(out.len(), len);
        assert!(out.iter().all(|v| *v >= p5 - 1e-9 && *v <= p95 + 1e-9));
        // clamping is monotone, so relative order survives
        for i in 0..len {
            for j in 0..len {
                if values[i] <= values[j] {
                    assert!(out[i] <= out[j]);
                }
            }
        }
    }
}

#[test]
fn test_hybrid_equals_blend_of_iqr_and_rank() {
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..50 {
        let len = rng.gen_range(4..30);
        let values = random_values(&mut rng, len);
        let iqr = detect_outliers(&values, OutlierMethod::Iqr, 1.5, 1.2);
        let hybrid = detect_outliers(&values, OutlierMethod::Hybrid, 1.5, 1.2);

        for i in 0..len {
            let expected = 0.7 * iqr.normalized[i] + 0.3 * iqr.ranks[i];
            assert!((hybrid.normalized[i] - expected).abs() < 1e-12);
        }
    }
}

#[test]
fn test_zscore_zero_deviation() {
    let result = detect_outliers(&[2.5; 12], OutlierMethod::ZScore, 2.0, 1.5);
    assert_eq!(result.normalized, vec![0.0; 12]);
    assert!(result.outliers.is_empty());
}

#[test]
fn test_large_tier_spike_ranks_first() {
    let changes = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 500.0, 3.5, 4.0, 4.5];
    let rows: Vec<Row> = changes
        .iter()
        .enumerate()
        .map(|(i, change)| Row {
            name: format!("LARGE{i}"),
            market_cap: 5e10,
            volume: 1e9,
            supply: 1e9,
            mcap_change: *change,
            change_24h: 1.0,
            change_7d: 3.0,
            volatility: 5.0,
        })
        .collect();

    let report = detect_early_momentum(&payload(&rows), MarketCapTier::Large, &MomentumScorer::default());

    assert_eq!(report.population, 10);
    let top = &report.tokens[0];
    assert_eq!(top.metrics.name, "LARGE6");
    assert!(top.is_outlier);
    assert!((top.outlier_bonus - 0.10).abs() < 1e-12);
    assert!(report.tokens[1..].iter().all(|t| !t.is_outlier));
}

#[test]
fn test_homogeneous_tier_uses_sigmoid_rescale() {
    // three tokens: neutral statistics, raw scores differ only by small terms
    let rows: Vec<Row> = [(4.0, 2.0), (30.0, 3.0), (80.0, 1.0)]
        .iter()
        .enumerate()
        .map(|(i, (volatility, mcap_change))| Row {
            name: format!("MICRO{i}"),
            market_cap: 5e7,
            volume: 1e5,
            supply: 1e9,
            mcap_change: *mcap_change,
            change_24h: 1.0,
            change_7d: 2.0,
            volatility: *volatility,
        })
        .collect();

    let scorer = MomentumScorer::default();
    let report = detect_early_momentum(&payload(&rows), MarketCapTier::Micro, &scorer);

    let raws: Vec<f64> = report.tokens.iter().map(|t| t.raw_score).collect();
    let spread = raws.iter().cloned().fold(f64::MIN, f64::max) - raws.iter().cloned().fold(f64::MAX, f64::min);
    assert!(spread < 0.3);
    assert!(spread <= 0.11);

    let finals: Vec<f64> = report.tokens.iter().map(|t| t.final_score).collect();
    assert_eq!(finals.len(), 3);
    assert!(finals[0] >= 0.9);
    assert!(finals[2] <= 0.21);
}

#[test]
fn test_spread_population_gets_fixed_top_scores() {
    let rows: Vec<Row> = (1..=10)
        .map(|i| {
            let i = i as f64;
            Row {
                name: format!("MID{i}"),
                market_cap: 2e9 + i * 1e8,
                volume: (2e9 + i * 1e8) * 0.01 * i,
                supply: 1e9,
                mcap_change: i,
                change_24h: i * 0.5,
                change_7d: i,
                volatility: i * 2.0,
            }
        })
        .collect();

    let report = detect_early_momentum(&payload(&rows), MarketCapTier::Mid, &MomentumScorer::default());
    let finals: Vec<f64> = report.tokens.iter().map(|t| t.final_score).collect();

    assert_eq!(&finals[..3], &[0.95, 0.92, 0.89]);
    assert_eq!(report.tokens[0].metrics.name, "MID10");
    let raws: Vec<f64> = report.tokens.iter().map(|t| t.raw_score).collect();
    assert!(raws[0] - raws[raws.len() - 1] >= 0.3);
}

#[test]
fn test_non_positive_mcap_change_never_returned() {
    let mut rng = StdRng::seed_from_u64(99);

    for round in 0..20 {
        let rows: Vec<Row> = (0..40)
            .map(|i| {
                let market_cap = 10f64.powf(rng.gen_range(7.5..11.5));
                Row {
                    name: format!("R{round}T{i}"),
                    market_cap,
                    volume: market_cap * rng.gen_range(0.0..0.3),
                    supply: market_cap / rng.gen_range(0.01..100.0),
                    mcap_change: if rng.gen_bool(0.1) {
                        rng.gen_range(50.0..400.0)
                    } else {
                        rng.gen_range(-10.0..10.0)
                    },
                    change_24h: rng.gen_range(-15.0..15.0),
                    change_7d: rng.gen_range(-30.0..30.0),
                    volatility: rng.gen_range(0.0..80.0),
                }
            })
            .collect();
        let snapshot = payload(&rows);

        for tier in MarketCapTier::all() {
            let report = detect_early_momentum(&snapshot, tier, &MomentumScorer::default());
            assert!(report.tokens.len() <= report.population);
            for token in &report.tokens {
                assert!(token.metrics.mcap_change_24h > 0.0);
                assert_eq!(token.metrics.tier, tier);
                assert!(token.final_score >= 0.15 && token.final_score <= 0.98);
                assert!((1..=7).contains(&token.duration_days));
            }
            assert!(report
                .tokens
                .windows(2)
                .all(|w| w[0].final_score >= w[1].final_score));
        }
    }
}

#[test]
fn test_bad_rows_are_counted_not_fatal() {
    let mut snapshot = payload(&[
        Row {
            name: "GOOD".to_string(),
            market_cap: 5e8,
            volume: 2e7,
            supply: 1e9,
            mcap_change: 4.0,
            change_24h: 3.0,
            change_7d: 5.0,
            volatility: 6.0,
        },
    ]);
    snapshot.values.push(vec![serde_json::json!("TRUNCATED")]);
    snapshot.values.push(vec![
        serde_json::json!("MESSY"),
        serde_json::json!("$300,000,000"),
        serde_json::json!("lots"),
        serde_json::json!(""),
        serde_json::json!("2.5%"),
    ]);

    let report = detect_early_momentum(&snapshot, MarketCapTier::Small, &MomentumScorer::default());

    assert_eq!(report.population, 2);
    assert_eq!(report.skipped, 1);
    let names: Vec<_> = report.tokens.iter().map(|t| t.metrics.name.as_str()).collect();
    assert!(names.contains(&"GOOD"));
    assert!(names.contains(&"MESSY"));
}

#[tokio::test]
async fn test_all_tiers_run_concurrently() {
    let rows: Vec<Row> = [5e10, 3e9, 4e8, 2e7]
        .iter()
        .flat_map(|base| {
            (0..6).map(move |i| Row {
                name: format!("T{base:e}-{i}"),
                market_cap: base * (1.0 + i as f64 * 0.1),
                volume: base * 0.02 * (1.0 + i as f64),
                supply: 1e9,
                mcap_change: 1.0 + i as f64,
                change_24h: 0.5 + i as f64,
                change_7d: 2.0 + i as f64,
                volatility: 5.0 + i as f64,
            })
        })
        .collect();

    let reports = analyze_all_tiers(Arc::new(payload(&rows)), Arc::new(MomentumScorer::default()))
        .await
        .expect("tier tasks should complete");

    assert_eq!(reports.len(), 4);
    for (report, tier) in reports.iter().zip(MarketCapTier::all()) {
        assert_eq!(report.tier, tier);
        assert_eq!(report.population, 6);
        assert!(!report.tokens.is_empty());
    }
}
