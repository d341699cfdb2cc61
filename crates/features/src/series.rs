//! Per-ticker time-series feature engine.
//!
//! Walks one ticker's date-ascending series once, feeding the rolling
//! accumulators and writing trailing-window metrics onto each record.

use crate::rolling::{RollingGainLoss, RollingMean, RollingStd};
use psx_core::{EnrichedRecord, WindowConfig};
use tracing::debug;

/// One pass of rolling-window state for a single ticker.
pub struct SeriesEngine {
    ma_short: RollingMean,
    ma_long: RollingMean,
    vol_short: RollingStd,
    vol_long: RollingStd,
    volume_ma: RollingMean,
    gain_loss: RollingGainLoss,
    volatility_window: usize,
    /// Window-gated metrics need at least the short window of history.
    has_min_history: bool,
    prev_close: Option<f64>,
    prev_dividend: Option<f64>,
}

impl SeriesEngine {
    /// Create an engine for a series of `series_len` records.
    pub fn new(windows: &WindowConfig, series_len: usize) -> Self {
        Self {
            ma_short: RollingMean::new(windows.ma_short),
            ma_long: RollingMean::new(windows.ma_long),
            vol_short: RollingStd::new(windows.ma_short),
            vol_long: RollingStd::new(windows.volatility_window),
            volume_ma: RollingMean::new(windows.ma_short),
            gain_loss: RollingGainLoss::new(windows.rsi_period),
            volatility_window: windows.volatility_window,
            has_min_history: series_len >= windows.ma_short,
            prev_close: None,
            prev_dividend: None,
        }
    }

    /// Feed the next record of the series and write its metrics.
    ///
    /// `MA_short`, `Volume_MA_short`, and their derived ratios use a
    /// minimum of one observation and are defined from the first record
    /// onward; every other metric is null until its own minimum period is
    /// met, and null throughout when the series is shorter than the short
    /// window.
    pub fn step(&mut self, record: &mut EnrichedRecord) {
        let close = record.base.close;
        let volume = record.base.volume as f64;
        let ret = record.daily_return / 100.0;

        self.ma_short.push(close);
        self.ma_long.push(close);
        self.vol_short.push(ret);
        self.vol_long.push(ret);
        self.volume_ma.push(volume);
        self.gain_loss.push(close);

        record.ma_short = self.ma_short.mean();
        record.price_vs_ma_short = record.ma_short.map(|ma| (close - ma) / ma * 100.0);
        record.volume_ma_short = self.volume_ma.mean();
        record.volume_trend = match record.volume_ma_short {
            Some(ma) if ma > 0.0 => Some((volume - ma) / ma * 100.0),
            _ => None,
        };

        if self.has_min_history {
            record.ma_long = self.ma_long.full_mean();
            record.price_vs_ma_long = record.ma_long.map(|ma| (close - ma) / ma * 100.0);
            record.volatility_short = self.vol_short.std_dev(2);
            record.volatility_long = self.vol_long.std_dev(self.volatility_window);
            record.price_change_pct = self.prev_close.map(|prev| (close - prev) / prev * 100.0);
            record.rsi = self.gain_loss.rsi();
        }

        record.dividend_growth_rate = match self.prev_dividend {
            Some(prev) if prev != 0.0 => Some((record.base.dividend - prev) / prev),
            _ => None,
        };

        self.prev_close = Some(close);
        self.prev_dividend = Some(record.base.dividend);
    }
}

/// Annotate one ticker's date-ascending series in place.
pub fn annotate_series(windows: &WindowConfig, series: &mut [EnrichedRecord]) {
    if series.is_empty() {
        return;
    }
    if series.len() < windows.ma_short {
        debug!(
            ticker = %series[0].base.ticker,
            len = series.len(),
            "series shorter than the short window; window-gated metrics stay null"
        );
    }

    let total_dividend: f64 = series.iter().map(|r| r.base.dividend).sum();
    let mut engine = SeriesEngine::new(windows, series.len());
    for record in series.iter_mut() {
        engine.step(record);
        record.total_dividend_paid = Some(total_dividend);
    }
}
