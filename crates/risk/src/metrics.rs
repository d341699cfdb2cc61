//! Whole-history risk statistics.
//!
//! Computed once per ticker over the full ordered series of decimal daily
//! returns, then broadcast identically onto every record of that ticker.

use ordered_float::OrderedFloat;
use psx_core::EnrichedRecord;
use statrs::statistics::Statistics;
use tracing::debug;

/// Trading periods per year used to annualize the Sharpe ratio.
pub const TRADING_PERIODS_PER_YEAR: f64 = 252.0;

/// Minimum observations for drawdown, Sharpe, and Value-at-Risk.
pub const MIN_RISK_OBSERVATIONS: usize = 5;
/// Minimum observations for the skewness estimator.
pub const MIN_SKEWNESS_OBSERVATIONS: usize = 3;
/// Minimum observations for the kurtosis estimator.
pub const MIN_KURTOSIS_OBSERVATIONS: usize = 4;

/// Risk statistics for one ticker's return history.
///
/// Each field is null until its own minimum observation count is met.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskMetrics {
    /// Deepest peak-to-trough decline of the cumulative return series (<= 0).
    pub max_drawdown: Option<f64>,
    /// Annualized mean/stddev of returns, zero risk-free rate.
    pub sharpe_ratio: Option<f64>,
    /// 5th percentile of the return distribution.
    pub value_at_risk_5: Option<f64>,
    /// Bias-corrected third standardized moment.
    pub return_skewness: Option<f64>,
    /// Bias-corrected excess kurtosis.
    pub return_kurtosis: Option<f64>,
}

/// Calculator for whole-history risk statistics.
pub struct RiskCalculator {
    periods_per_year: f64,
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_PERIODS_PER_YEAR,
        }
    }
}

impl RiskCalculator {
    /// Create a calculator with the default annualization factor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute risk statistics from a decimal return series.
    pub fn calculate(&self, returns: &[f64]) -> RiskMetrics {
        let n = returns.len();
        let mut metrics = RiskMetrics::default();

        if n >= MIN_SKEWNESS_OBSERVATIONS {
            metrics.return_skewness = skewness(returns);
        }
        if n >= MIN_KURTOSIS_OBSERVATIONS {
            metrics.return_kurtosis = excess_kurtosis(returns);
        }
        if n >= MIN_RISK_OBSERVATIONS {
            metrics.max_drawdown = Some(self.max_drawdown(returns));
            metrics.sharpe_ratio = Some(self.sharpe_ratio(returns));
            metrics.value_at_risk_5 = Some(percentile(returns, 5.0));
        } else {
            debug!(observations = n, "return history too short for risk block");
        }

        metrics
    }

    /// Broadcast the ticker's risk statistics onto every record of its series.
    pub fn annotate_series(&self, series: &mut [EnrichedRecord]) {
        let returns: Vec<f64> = series
            .iter()
            .map(|r| r.daily_return / 100.0)
            .filter(|r| r.is_finite())
            .collect();
        let metrics = self.calculate(&returns);

        for record in series.iter_mut() {
            record.max_drawdown = metrics.max_drawdown;
            record.sharpe_ratio = metrics.sharpe_ratio;
            record.value_at_risk_5 = metrics.value_at_risk_5;
            record.return_skewness = metrics.return_skewness;
            record.return_kurtosis = metrics.return_kurtosis;
        }
    }

    /// Minimum of `(C_t - max(C_1..C_t)) / max(C_1..C_t)` over the
    /// cumulative return series `C_t = prod(1 + r_i)`.
    fn max_drawdown(&self, returns: &[f64]) -> f64 {
        let mut cumulative = 1.0;
        let mut peak = f64::MIN;
        let mut max_drawdown = 0.0f64;

        for r in returns {
            cumulative *= 1.0 + r;
            peak = peak.max(cumulative);
            if peak > 0.0 {
                let drawdown = (cumulative - peak) / peak;
                max_drawdown = max_drawdown.min(drawdown);
            }
        }

        max_drawdown
    }

    /// Annualized Sharpe ratio with a zero risk-free rate; 0 when the
    /// return series has no dispersion.
    fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        let mean = returns.iter().copied().mean();
        let std_dev = returns.iter().copied().std_dev();

        if std_dev > 0.0 {
            mean / std_dev * self.periods_per_year.sqrt()
        } else {
            0.0
        }
    }
}

/// Percentile with linear interpolation between order statistics.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_unstable_by_key(|&v| OrderedFloat(v));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;

    if lo + 1 < sorted.len() {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    } else {
        sorted[lo]
    }
}

/// Bias-corrected sample skewness (Fisher-Pearson G1).
///
/// `None` when the series has no dispersion.
fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let mean = values.iter().copied().mean();
    let std_dev = values.iter().copied().std_dev();
    if std_dev <= 0.0 {
        return None;
    }

    let sum_cubed: f64 = values.iter().map(|v| ((v - mean) / std_dev).powi(3)).sum();
    Some(n / ((n - 1.0) * (n - 2.0)) * sum_cubed)
}

/// Bias-corrected excess kurtosis (sample G2).
///
/// `None` when the series has no dispersion.
fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let mean = values.iter().copied().mean();
    let std_dev = values.iter().copied().std_dev();
    if std_dev <= 0.0 {
        return None;
    }

    let sum_fourth: f64 = values.iter().map(|v| ((v - mean) / std_dev).powi(4)).sum();
    let term = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0)) * sum_fourth;
    Some(term - 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0)))
}
