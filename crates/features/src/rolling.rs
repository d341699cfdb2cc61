//! Sliding-window accumulators for ordered per-ticker series.
//!
//! Each accumulator keeps a bounded deque of recent observations plus
//! running sums, so feeding a series forward is O(1) per step and uses only
//! current-and-prior observations (no lookahead).

use std::collections::VecDeque;

/// Rolling arithmetic mean over a fixed window.
pub struct RollingMean {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    /// Create a rolling mean over `window` observations.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    /// Add an observation, evicting the oldest when the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    /// Best-effort mean: defined from the first observation onward.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    /// Mean over the full window only; `None` until the window fills.
    pub fn full_mean(&self) -> Option<f64> {
        if self.values.len() >= self.window {
            self.mean()
        } else {
            None
        }
    }

    /// Number of observations currently in the window.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no observations have been seen.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rolling sample standard deviation (n-1 denominator) over a fixed window.
pub struct RollingStd {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingStd {
    /// Create a rolling standard deviation over `window` observations.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Add an observation, evicting the oldest when the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Sample standard deviation over the current window.
    ///
    /// `None` until at least `min_periods` observations (and never fewer
    /// than 2) are available. Passing the window size as `min_periods`
    /// requires the full window.
    pub fn std_dev(&self, min_periods: usize) -> Option<f64> {
        let n = self.values.len();
        if n < min_periods.max(2) {
            return None;
        }

        let n_f = n as f64;
        let mean = self.sum / n_f;
        let variance = (self.sum_sq - n_f * mean * mean) / (n_f - 1.0);

        // Running-sum cancellation can push a zero variance slightly negative.
        if variance <= 0.0 {
            Some(0.0)
        } else {
            Some(variance.sqrt())
        }
    }
}

/// Rolling gain/loss averages over day-over-day deltas, for RSI.
///
/// Tracks the deltas between consecutive observations inside the trailing
/// `period` observations, i.e. at most `period - 1` deltas.
pub struct RollingGainLoss {
    max_deltas: usize,
    deltas: VecDeque<f64>,
    gain_sum: f64,
    loss_sum: f64,
    prev: Option<f64>,
}

impl RollingGainLoss {
    /// Create an accumulator for an RSI period of `period` observations.
    pub fn new(period: usize) -> Self {
        let max_deltas = period.saturating_sub(1).max(1);
        Self {
            max_deltas,
            deltas: VecDeque::with_capacity(max_deltas),
            gain_sum: 0.0,
            loss_sum: 0.0,
            prev: None,
        }
    }

    /// Add the next close price.
    pub fn push(&mut self, close: f64) {
        if let Some(prev) = self.prev {
            let delta = close - prev;
            if self.deltas.len() >= self.max_deltas {
                if let Some(old) = self.deltas.pop_front() {
                    if old > 0.0 {
                        self.gain_sum -= old;
                    } else {
                        self.loss_sum -= -old;
                    }
                }
            }
            self.deltas.push_back(delta);
            if delta > 0.0 {
                self.gain_sum += delta;
            } else {
                self.loss_sum += -delta;
            }
        }
        self.prev = Some(close);
    }

    /// Average gain and average loss over the full delta window.
    ///
    /// `None` until the full period of observations has been seen.
    pub fn averages(&self) -> Option<(f64, f64)> {
        if self.deltas.len() < self.max_deltas {
            return None;
        }
        let n = self.deltas.len() as f64;
        Some((self.gain_sum / n, self.loss_sum / n))
    }

    /// Relative Strength Index from the current gain/loss averages.
    ///
    /// 100 when there are gains but no losses; `None` while warming up or
    /// when the window is entirely flat.
    pub fn rsi(&self) -> Option<f64> {
        let (avg_gain, avg_loss) = self.averages()?;
        if avg_loss > 0.0 {
            let rs = avg_gain / avg_loss;
            Some(100.0 - 100.0 / (1.0 + rs))
        } else if avg_gain > 0.0 {
            Some(100.0)
        } else {
            None
        }
    }
}
