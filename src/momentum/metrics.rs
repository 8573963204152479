//! Metric extraction: raw sheet rows to canonical [`TokenMetrics`].
//!
//! Column presence varies between snapshots, so each row first goes through
//! [`RawTokenRow::from_cells`], the single place where cells are parsed and
//! malformed values are logged and dropped. Derivation rules then substitute
//! defaults field by field.

use crate::momentum::error::SkipReason;
use crate::momentum::types::{ExtractionReport, SkippedRow, TokenMetrics};
use crate::types::{cell_to_string, MarketCapTier, SheetPayload};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

pub mod columns {
    pub const NAME: &[&str] = &["Tokens"];
    pub const PRICE: &[&str] = &["Price"];
    pub const MARKET_CAP: &[&str] = &["Market Cap"];
    pub const TOTAL_VOLUME: &[&str] = &["Total Volume"];
    pub const CIRCULATING_SUPPLY: &[&str] = &["Circulating Supply"];
    pub const MCAP_CHANGE_24H: &[&str] = &["Market Cap (Change 24h)"];
    pub const PRICE_CHANGE_24H: &[&str] = &["Price Changes 24h", "Price Change 24h"];
    pub const PRICE_CHANGE_7D: &[&str] = &["Price Changes 7d", "Price Change 7d"];
    pub const VOLATILITY_24H: &[&str] = &["Volatility 24h"];
    pub const VOLATILITY: &[&str] = &["Volatility"];
    // upstream sheet ships the misspelled header
    pub const TURNOVER_PCT: &[&str] = &[
        "Turnover (% Cirulating Supply Traded)",
        "Turnover (% Circulating Supply Traded)",
    ];
    pub const HYPE_ACTIVITY: &[&str] = &["Hype Activity"];

    /// Columns needed for full-fidelity computation.
    pub const REQUIRED: &[&[&str]] = &[
        NAME,
        MARKET_CAP,
        TOTAL_VOLUME,
        CIRCULATING_SUPPLY,
        MCAP_CHANGE_24H,
    ];
}

/// Header name to position lookup.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
    len: usize,
}

impl ColumnIndex {
    pub fn new(header: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(header.len());
        for (idx, name) in header.iter().enumerate() {
            // last occurrence wins on duplicate headers
            positions.insert(name.trim().to_string(), idx);
        }
        Self {
            positions,
            len: header.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of the first alias present in the header.
    pub fn position(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.positions.get(*a).copied())
    }

    pub fn has(&self, aliases: &[&str]) -> bool {
        self.position(aliases).is_some()
    }

    /// Names of required columns absent from the header.
    pub fn missing_required(&self) -> Vec<&'static str> {
        columns::REQUIRED
            .iter()
            .filter(|aliases| !self.has(aliases))
            .map(|aliases| aliases[0])
            .collect()
    }

    fn cell<'a>(&self, row: &'a [Value], aliases: &[&str]) -> Option<&'a Value> {
        self.position(aliases).and_then(|idx| row.get(idx))
    }
}

/// Parse a sheet cell as a number.
///
/// Accepts JSON numbers and strings carrying `$`, `,`, `%` or surrounding
/// whitespace. Empty cells give `Ok(None)`; anything unparsable or
/// non-finite gives `Err` with the raw text.
pub fn parse_number(cell: &Value) -> Result<Option<f64>, String> {
    let parsed = match cell {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%'))
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(cell_to_string(cell)),
    }
}

/// One data row with every schema field made explicitly optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTokenRow {
    pub row_index: usize,
    pub name: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub mcap_change_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_7d: Option<f64>,
    pub volatility_24h: Option<f64>,
    pub volatility: Option<f64>,
    pub turnover_pct: Option<f64>,
    pub hype_activity: Option<f64>,
    /// Both the volume and the market cap columns exist in the header
    pub has_volume_and_mcap_columns: bool,
}

impl RawTokenRow {
    /// Normalize one data row. Rows shorter than the header are padded with
    /// empty cells; rows with fewer than `min(3, header_len)` cells are
    /// rejected.
    pub fn from_cells(
        columns: &ColumnIndex,
        row_index: usize,
        cells: &[Value],
    ) -> Result<Self, SkipReason> {
        let required = columns.len().min(3);
        if cells.len() < required {
            return Err(SkipReason::RowTooShort {
                len: cells.len(),
                required,
            });
        }

        let name = columns
            .cell(cells, columns::NAME)
            .map(cell_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("Unknown-{row_index}"));

        let field = |aliases: &[&str]| -> Option<f64> {
            let cell = columns.cell(cells, aliases)?;
            match parse_number(cell) {
                Ok(v) => v,
                Err(raw) => {
                    warn!(token = %name, field = aliases[0], raw = %raw, "Malformed numeric field, using default");
                    None
                }
            }
        };

        Ok(Self {
            row_index,
            price: field(columns::PRICE),
            market_cap: field(columns::MARKET_CAP),
            total_volume: field(columns::TOTAL_VOLUME),
            circulating_supply: field(columns::CIRCULATING_SUPPLY),
            mcap_change_24h: field(columns::MCAP_CHANGE_24H),
            price_change_24h: field(columns::PRICE_CHANGE_24H),
            price_change_7d: field(columns::PRICE_CHANGE_7D),
            volatility_24h: field(columns::VOLATILITY_24H),
            volatility: field(columns::VOLATILITY),
            turnover_pct: field(columns::TURNOVER_PCT),
            hype_activity: field(columns::HYPE_ACTIVITY),
            has_volume_and_mcap_columns: columns.has(columns::TOTAL_VOLUME)
                && columns.has(columns::MARKET_CAP),
            name,
        })
    }

    /// Reported market cap, or `price * circulating_supply` when the reported
    /// value is missing or non-positive.
    pub fn resolved_market_cap(&self) -> f64 {
        let reported = self.market_cap.unwrap_or(0.0);
        if reported > 0.0 {
            return reported;
        }
        match (self.price, self.circulating_supply) {
            (Some(price), Some(supply)) if price > 0.0 && supply > 0.0 => {
                let market_cap = price * supply;
                debug!(token = %self.name, market_cap, "Reconstructed market cap from price and supply");
                market_cap
            }
            _ => reported,
        }
    }
}

/// Volume-change proxy from the volume/market-cap ratio. No historical
/// volume series exists upstream, so this is a bucketed estimate.
pub fn estimate_volume_change(volume: f64, market_cap: f64, price_change: f64) -> f64 {
    if market_cap <= 0.0 {
        return 0.0;
    }
    let vmr_pct = volume / market_cap * 100.0;
    let mut change: f64 = if vmr_pct > 10.0 {
        30.0
    } else if vmr_pct > 5.0 {
        15.0
    } else if vmr_pct > 2.0 {
        5.0
    } else {
        0.0
    };
    if price_change > 0.0 && vmr_pct > 1.0 {
        change = change.max(price_change);
    }
    change
}

/// Three-level price/volume agreement proxy.
pub fn correlation_proxy(price_change: f64, volume_change: f64) -> f64 {
    if price_change > 0.0 && volume_change > 0.0 {
        1.0
    } else if price_change < 0.0 && volume_change < 0.0 {
        0.3
    } else {
        0.5
    }
}

/// Convert one normalized row into metrics for the requested tier.
pub fn extract_metrics(
    raw: &RawTokenRow,
    tier: MarketCapTier,
) -> Result<TokenMetrics, SkipReason> {
    let market_cap = raw.resolved_market_cap();
    let actual = MarketCapTier::from_market_cap(market_cap);
    if actual != tier {
        return Err(SkipReason::TierMismatch {
            actual,
            requested: tier,
        });
    }

    let volume = raw.total_volume.unwrap_or(0.0);
    let circulating_supply = raw.circulating_supply.unwrap_or(0.0);
    let mcap_change = raw.mcap_change_24h.unwrap_or(0.0);
    let price_change = raw.price_change_24h.unwrap_or(0.0);

    // the proxy reads the reported cap, not the reconstructed one
    let volume_change = if raw.has_volume_and_mcap_columns {
        estimate_volume_change(volume, raw.market_cap.unwrap_or(0.0), price_change)
    } else {
        0.0
    };

    let mut turnover = match raw.turnover_pct {
        Some(t) => t,
        None if circulating_supply > 0.0 => volume / circulating_supply * 100.0,
        None => 0.0,
    };
    if turnover > 0.0 {
        turnover = turnover.ln_1p();
    }

    let hype_activity = match raw.hype_activity {
        Some(h) => h,
        None if market_cap > 0.0 => volume / market_cap * 100.0,
        None => 0.0,
    };

    let volatility = [raw.volatility_24h, raw.volatility]
        .into_iter()
        .flatten()
        .find(|v| *v > 0.0)
        .unwrap_or_else(|| {
            if price_change != 0.0 {
                price_change.abs()
            } else {
                1.0
            }
        });

    for (field, value) in [
        ("market_cap", market_cap),
        ("turnover", turnover),
        ("hype_activity", hype_activity),
        ("volatility", volatility),
    ] {
        if !value.is_finite() {
            return Err(SkipReason::NonFiniteMetric { field, value });
        }
    }

    Ok(TokenMetrics {
        name: raw.name.clone(),
        row_index: raw.row_index,
        market_cap,
        tier: actual,
        turnover,
        hype_activity,
        vmr: hype_activity / 100.0,
        volatility,
        mcap_change_24h: mcap_change,
        price_change_24h: price_change,
        price_change_7d: raw.price_change_7d.unwrap_or(0.0),
        volume_change_24h: volume_change,
        price_volume_correlation: correlation_proxy(price_change, volume_change),
    })
}

/// Extract the population of one tier, collecting skipped rows instead of
/// aborting on them.
#[instrument(skip(payload), fields(rows = payload.rows().len()))]
pub fn extract_tier(payload: &SheetPayload, tier: MarketCapTier) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    let Some(header) = payload.header() else {
        warn!("No valid data available for analysis");
        return report;
    };
    let columns = ColumnIndex::new(&header);

    let missing = columns.missing_required();
    if !missing.is_empty() {
        warn!(
            "Missing required columns for momentum analysis: {}; estimating missing values",
            missing.join(", ")
        );
    }

    for (row_index, cells) in payload.rows().iter().enumerate() {
        let outcome = RawTokenRow::from_cells(&columns, row_index, cells)
            .map_err(|reason| (None, reason))
            .and_then(|raw| {
                extract_metrics(&raw, tier).map_err(|reason| (Some(raw.name.clone()), reason))
            });

        match outcome {
            Ok(metrics) => report.tokens.push(metrics),
            Err((name, reason)) => {
                if reason.is_anomaly() {
                    warn!(row = row_index, token = ?name, "Skipping row: {}", reason);
                }
                report.skipped.push(SkippedRow {
                    row_index,
                    name,
                    reason,
                });
            }
        }
    }

    debug!(
        "Extracted {} {} tokens ({} anomalies)",
        report.tokens.len(),
        tier,
        report.anomalies().count()
    );
    report
}
