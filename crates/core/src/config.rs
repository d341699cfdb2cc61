//! Configuration for the psx enrichment pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Immutable configuration for one `transform` invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransformConfig {
    /// Feature toggles.
    pub features: FeatureToggles,
    /// Rolling-window sizes.
    pub windows: WindowConfig,
    /// Batch limits and execution settings.
    pub limits: BatchLimits,
}

impl TransformConfig {
    /// Reject degenerate window and batch settings.
    pub fn validate(&self) -> Result<()> {
        if self.windows.ma_short == 0 {
            return Err(Error::config("ma_short window must be at least 1"));
        }
        if self.windows.ma_long < self.windows.ma_short {
            return Err(Error::config(
                "ma_long window must be at least the ma_short window",
            ));
        }
        if self.windows.volatility_window == 0 {
            return Err(Error::config("volatility window must be at least 1"));
        }
        if self.windows.rsi_period < 2 {
            return Err(Error::config("RSI period must be at least 2"));
        }
        if self.limits.max_batch_size == 0 {
            return Err(Error::config("max batch size must be at least 1"));
        }
        Ok(())
    }
}

/// Toggles enabling or disabling whole pipeline phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Per-ticker time-series metrics (moving averages, volatility, RSI).
    pub technical_indicators: bool,
    /// Cross-sectional sector/industry benchmarking.
    pub sector_analysis: bool,
    /// Whole-history risk metrics.
    pub risk_metrics: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            technical_indicators: true,
            sector_analysis: true,
            risk_metrics: true,
        }
    }
}

/// Rolling-window sizes, in trading periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Short moving-average window.
    pub ma_short: usize,
    /// Long moving-average window.
    pub ma_long: usize,
    /// Long volatility window.
    pub volatility_window: usize,
    /// RSI period, counted in records (period - 1 close deltas).
    pub rsi_period: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            ma_short: 7,
            ma_long: 30,
            volatility_window: 30,
            rsi_period: 14,
        }
    }
}

/// Batch ceiling and execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLimits {
    /// Maximum number of raw records accepted per invocation.
    pub max_batch_size: usize,
    /// Run the per-ticker phases on a worker pool.
    pub parallel: bool,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransformConfig::default();
        assert_eq!(config.windows.ma_short, 7);
        assert_eq!(config.windows.ma_long, 30);
        assert_eq!(config.windows.volatility_window, 30);
        assert_eq!(config.windows.rsi_period, 14);
        assert_eq!(config.limits.max_batch_size, 100);
        assert!(config.features.technical_indicators);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_windows() {
        let mut config = TransformConfig::default();
        config.windows.ma_short = 0;
        assert!(config.validate().is_err());

        let mut config = TransformConfig::default();
        config.windows.rsi_period = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_ma_windows() {
        let mut config = TransformConfig::default();
        config.windows.ma_long = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_batch_ceiling() {
        let mut config = TransformConfig::default();
        config.limits.max_batch_size = 0;
        assert!(config.validate().is_err());
    }
}
