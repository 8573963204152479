//! Run the momentum pipeline over a randomly generated market snapshot

use anyhow::Result;
use clap::Parser;
use early_momentum::momentum::{analyze_all_tiers, MomentumScorer};
use early_momentum::SheetPayload;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{info, Level};

const HEADER: [&str; 10] = [
    "Tokens",
    "Price",
    "Market Cap",
    "Total Volume",
    "Circulating Supply",
    "Market Cap (Change 24h)",
    "Price Changes 24h",
    "Price Changes 7d",
    "Volatility 24h",
    "Hype Activity",
];

/// Score a synthetic market snapshot
#[derive(Parser)]
#[command(name = "simulate_market")]
struct Args {
    /// Number of tokens to generate
    #[arg(long, default_value_t = 300)]
    tokens: usize,

    /// RNG seed for a reproducible snapshot
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Share of tokens given a momentum spike
    #[arg(long, default_value_t = 0.05)]
    spike_rate: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();
    info!("Generating {} tokens (seed {})", args.tokens, args.seed);

    let payload = generate_snapshot(args.tokens, args.seed, args.spike_rate);
    let reports = analyze_all_tiers(Arc::new(payload), Arc::new(MomentumScorer::default())).await?;

    for report in &reports {
        info!(
            "{}: {} of {} tokens with early momentum",
            report.tier,
            report.tokens.len(),
            report.population
        );
        for token in report.tokens.iter().take(3) {
            info!(
                "  {} score={:.2} raw={:.3} {} ~{}d outlier={}",
                token.metrics.name,
                token.final_score,
                token.raw_score,
                token.momentum_type,
                token.duration_days,
                token.is_outlier
            );
        }
    }

    Ok(())
}

fn generate_snapshot(count: usize, seed: u64, spike_rate: f64) -> SheetPayload {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(count);

    for i in 0..count {
        // log-uniform market cap between 10M and 1T
        let market_cap = 10f64.powf(rng.gen_range(7.0..12.0));
        let price = 10f64.powf(rng.gen_range(-4.0..4.0));
        let supply = market_cap / price;
        let vmr = rng.gen_range(0.005..0.25);
        let spiking = rng.gen_bool(spike_rate.clamp(0.0, 1.0));

        let mcap_change: f64 = if spiking {
            rng.gen_range(25.0..300.0)
        } else {
            rng.gen_range(-8.0..8.0)
        };
        let change_24h = mcap_change * rng.gen_range(0.8..1.1);
        let change_7d = change_24h * rng.gen_range(0.5..3.0) + rng.gen_range(-5.0..5.0);
        let volatility = change_24h.abs() * rng.gen_range(0.5..2.0);

        // occasionally drop the explicit hype column
        let hype = if rng.gen_bool(0.8) {
            format!("{:.4}", vmr * 100.0)
        } else {
            String::new()
        };

        rows.push(vec![
            format!("SIM{i:04}"),
            format!("{price:.6}"),
            format!("{market_cap:.0}"),
            format!("{:.0}", market_cap * vmr),
            format!("{supply:.0}"),
            format!("{mcap_change:.2}"),
            format!("{change_24h:.2}"),
            format!("{change_7d:.2}"),
            format!("{volatility:.2}"),
            hype,
        ]);
    }

    SheetPayload::from_rows(&HEADER, rows)
}
