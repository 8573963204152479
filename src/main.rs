//! Early momentum CLI
//!
//! Reads a sheet snapshot (`{"values": [[header...], [row...]]}`) and prints
//! the tokens showing early momentum in each market-cap tier.

use anyhow::{Context, Result};
use clap::Parser;
use early_momentum::momentum::{analyze_all_tiers, detect_early_momentum, MomentumConfig, MomentumScorer, TierReport};
use early_momentum::{MarketCapTier, SheetPayload};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

/// Rank tokens by early momentum within their market-cap tier
#[derive(Parser)]
#[command(name = "early-momentum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sheet payload JSON file, or `-` for stdin
    input: String,

    /// Only score this tier (large, mid, small, micro)
    #[arg(short, long)]
    tier: Option<MarketCapTier>,

    /// JSON file overriding the scoring configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tokens to show per tier
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => MomentumConfig::from_json_file(path)?,
        None => MomentumConfig::default(),
    };
    let scorer = Arc::new(MomentumScorer::new(config));
    let payload = read_payload(&cli.input)?;

    info!("Loaded snapshot with {} data rows", payload.rows().len());

    let mut reports = match cli.tier {
        Some(tier) => vec![detect_early_momentum(&payload, tier, &scorer)],
        None => analyze_all_tiers(Arc::new(payload), scorer).await?,
    };
    for report in &mut reports {
        report.tokens.truncate(cli.top);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    Ok(())
}

fn read_payload(input: &str) -> Result<SheetPayload> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };
    serde_json::from_str(&raw).context("payload is not a valid sheet snapshot")
}

fn print_report(report: &TierReport) {
    println!(
        "== {} | {} with momentum of {} tokens ({} skipped) ==",
        report.tier,
        report.tokens.len(),
        report.population,
        report.skipped
    );

    if report.tokens.is_empty() {
        println!("   no early momentum detected");
    }

    for (rank, token) in report.tokens.iter().enumerate() {
        println!(
            "{:>3}. {:<14} {:.2}  {:<11} {:<20} ~{}d  mcap {:+.2}%  hype {:.2}%{}",
            rank + 1,
            token.metrics.name,
            token.final_score,
            token.momentum_strength,
            token.momentum_type,
            token.duration_days,
            token.metrics.mcap_change_24h,
            token.metrics.hype_activity,
            if token.is_outlier { "  [outlier]" } else { "" }
        );
    }
    println!();
}
