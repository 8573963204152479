//! Early Momentum - tier-relative momentum scoring for crypto tokens
//!
//! This crate ranks tokens inside their market-cap tier by combining robust
//! outlier statistics, rank normalization and tier-tuned weights into a
//! bounded early momentum score.

pub mod types;
pub mod momentum;

// Re-export main types for convenience
pub use types::{MarketCapTier, SheetPayload};
