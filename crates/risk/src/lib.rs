//! Risk statistics for the psx enrichment pipeline.
//!
//! This crate handles:
//! - Whole-history drawdown, Sharpe, and Value-at-Risk per ticker
//! - Higher-moment return statistics (skewness, excess kurtosis)
//! - Broadcasting the per-ticker risk block onto each record

pub mod metrics;

pub use metrics::{RiskCalculator, RiskMetrics};
