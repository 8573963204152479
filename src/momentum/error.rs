//! Per-row skip taxonomy for metric extraction.
//!
//! Nothing in the scoring core is fatal: a row either yields metrics or a
//! `SkipReason` that the batch records and moves past.

use crate::types::MarketCapTier;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("row has {len} cells, at least {required} required")]
    RowTooShort { len: usize, required: usize },

    #[error("token belongs to {actual}, not {requested}")]
    TierMismatch {
        actual: MarketCapTier,
        requested: MarketCapTier,
    },

    #[error("non-finite {field} after derivation: {value}")]
    NonFiniteMetric { field: &'static str, value: f64 },
}

impl SkipReason {
    /// Tier mismatches are routine filtering, not anomalies.
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, SkipReason::TierMismatch { .. })
    }
}
