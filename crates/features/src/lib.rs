//! Feature computation for the psx enrichment pipeline.
//!
//! This crate handles:
//! - Per-record basic price/volume metrics
//! - Rolling-window accumulators (mean, sample std, RSI gain/loss)
//! - The per-ticker time-series engine
//! - Cross-sectional sector/industry benchmarking

pub mod basic;
pub mod cross_section;
pub mod rolling;
pub mod series;

pub use cross_section::annotate_cross_section;
pub use rolling::{RollingGainLoss, RollingMean, RollingStd};
pub use series::{annotate_series, SeriesEngine};
