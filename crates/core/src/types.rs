//! Core data types for the psx enrichment pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version string stamped on every enriched record.
pub const TRANSFORMATION_VERSION: &str = "2.0.0";

/// Round a value to 4 decimal places.
///
/// Values whose scaled magnitude exceeds 2^53 have no representable
/// fractional part and are returned unchanged.
#[inline]
pub fn round4(v: f64) -> f64 {
    let scaled = v * 10_000.0;
    if scaled.abs() >= 9.007_199_254_740_992e15 {
        return v;
    }
    scaled.round() / 10_000.0
}

/// Serde adapter for the canonical `%Y-%m-%dT%H:%M:%SZ` date format.
pub mod date_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Market capitalization bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketCapCategory {
    Small,
    Mid,
    Large,
}

impl MarketCapCategory {
    /// Bucket a market capitalization in dollars.
    pub fn from_market_cap(market_cap: f64) -> Self {
        if market_cap < 2e9 {
            MarketCapCategory::Small
        } else if market_cap < 10e9 {
            MarketCapCategory::Mid
        } else {
            MarketCapCategory::Large
        }
    }
}

/// A raw record that has passed validation and normalization.
///
/// Ticker is uppercase `[A-Z]{1,5}`, the date is UTC, and price fields are
/// rounded to 4 decimals. Optional company attributes stay absent when the
/// source record omitted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Date", with = "date_format")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: i64,
    #[serde(rename = "Dividend")]
    pub dividend: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(rename = "marketCap", default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(rename = "trailingPE", default, skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE", default, skip_serializing_if = "Option::is_none")]
    pub forward_pe: Option<f64>,
    #[serde(rename = "dividendYield", default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "dividendRate", default, skip_serializing_if = "Option::is_none")]
    pub dividend_rate: Option<f64>,
    #[serde(rename = "averageVolume", default, skip_serializing_if = "Option::is_none")]
    pub average_volume: Option<f64>,
    #[serde(rename = "previousClose", default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
}

impl CleanRecord {
    /// Intraday return in percent: (Close - Open) / Open * 100.
    #[inline]
    pub fn daily_return(&self) -> f64 {
        if self.open > 0.0 {
            (self.close - self.open) / self.open * 100.0
        } else {
            0.0
        }
    }

    /// High minus low.
    #[inline]
    pub fn price_range(&self) -> f64 {
        self.high - self.low
    }

    /// (High + Low + Close) / 3.
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Volume relative to the reported average volume, 1.0 when unknown.
    #[inline]
    pub fn relative_volume(&self) -> f64 {
        match self.average_volume {
            Some(avg) if avg > 0.0 => self.volume as f64 / avg,
            _ => 1.0,
        }
    }
}

/// A clean record plus every derived field produced by the pipeline.
///
/// Derived numeric fields are `Option<f64>`: a finite value, or `None` when
/// the record's ticker lacked the history (or attributes) the metric needs.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub base: CleanRecord,

    // Basic per-record metrics.
    #[serde(rename = "Daily_Return")]
    pub daily_return: f64,
    #[serde(rename = "Price_Range")]
    pub price_range: f64,
    #[serde(rename = "Typical_Price")]
    pub typical_price: f64,
    #[serde(rename = "Relative_Volume")]
    pub relative_volume: f64,
    #[serde(rename = "Volume_Weighted_Price")]
    pub volume_weighted_price: f64,
    #[serde(rename = "PE_Growth")]
    pub pe_growth: Option<f64>,
    #[serde(rename = "Market_Cap_Category", skip_serializing_if = "Option::is_none")]
    pub market_cap_category: Option<MarketCapCategory>,

    // Time-series metrics (per ticker, trailing windows only).
    #[serde(rename = "MA_short")]
    pub ma_short: Option<f64>,
    #[serde(rename = "MA_long")]
    pub ma_long: Option<f64>,
    #[serde(rename = "Volatility_short")]
    pub volatility_short: Option<f64>,
    #[serde(rename = "Volatility_long")]
    pub volatility_long: Option<f64>,
    #[serde(rename = "Price_Change_Pct")]
    pub price_change_pct: Option<f64>,
    #[serde(rename = "Price_vs_MA_short")]
    pub price_vs_ma_short: Option<f64>,
    #[serde(rename = "Price_vs_MA_long")]
    pub price_vs_ma_long: Option<f64>,
    #[serde(rename = "Volume_MA_short")]
    pub volume_ma_short: Option<f64>,
    #[serde(rename = "Volume_Trend")]
    pub volume_trend: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "Total_Dividend_Paid")]
    pub total_dividend_paid: Option<f64>,
    #[serde(rename = "Dividend_Growth_Rate")]
    pub dividend_growth_rate: Option<f64>,

    // Cross-sectional metrics (whole batch).
    #[serde(rename = "Sector_Relative_Performance")]
    pub sector_relative_performance: Option<f64>,
    #[serde(rename = "Sector_Avg_Return")]
    pub sector_avg_return: Option<f64>,
    #[serde(rename = "Industry_Relative_Performance")]
    pub industry_relative_performance: Option<f64>,
    #[serde(rename = "Industry_Avg_Return")]
    pub industry_avg_return: Option<f64>,
    #[serde(rename = "PE_vs_Sector_Avg")]
    pub pe_vs_sector_avg: Option<f64>,

    // Whole-history risk metrics (per ticker, broadcast to every record).
    #[serde(rename = "Max_Drawdown")]
    pub max_drawdown: Option<f64>,
    #[serde(rename = "Sharpe_Ratio")]
    pub sharpe_ratio: Option<f64>,
    #[serde(rename = "Value_at_Risk_5")]
    pub value_at_risk_5: Option<f64>,
    #[serde(rename = "Return_Skewness")]
    pub return_skewness: Option<f64>,
    #[serde(rename = "Return_Kurtosis")]
    pub return_kurtosis: Option<f64>,
}

impl EnrichedRecord {
    /// Wrap a clean record with every derived field unset.
    pub fn from_clean(base: CleanRecord) -> Self {
        Self {
            base,
            daily_return: 0.0,
            price_range: 0.0,
            typical_price: 0.0,
            relative_volume: 1.0,
            volume_weighted_price: 0.0,
            pe_growth: None,
            market_cap_category: None,
            ma_short: None,
            ma_long: None,
            volatility_short: None,
            volatility_long: None,
            price_change_pct: None,
            price_vs_ma_short: None,
            price_vs_ma_long: None,
            volume_ma_short: None,
            volume_trend: None,
            rsi: None,
            total_dividend_paid: None,
            dividend_growth_rate: None,
            sector_relative_performance: None,
            sector_avg_return: None,
            industry_relative_performance: None,
            industry_avg_return: None,
            pe_vs_sector_avg: None,
            max_drawdown: None,
            sharpe_ratio: None,
            value_at_risk_5: None,
            return_skewness: None,
            return_kurtosis: None,
        }
    }

    /// True when any derived numeric field holds a non-finite value.
    ///
    /// Used by the safety layer to report computation faults before the
    /// record is serialized (non-finite floats serialize as null).
    pub fn has_non_finite(&self) -> bool {
        let always = [
            self.daily_return,
            self.price_range,
            self.typical_price,
            self.relative_volume,
            self.volume_weighted_price,
        ];
        let optional = [
            self.pe_growth,
            self.ma_short,
            self.ma_long,
            self.volatility_short,
            self.volatility_long,
            self.price_change_pct,
            self.price_vs_ma_short,
            self.price_vs_ma_long,
            self.volume_ma_short,
            self.volume_trend,
            self.rsi,
            self.total_dividend_paid,
            self.dividend_growth_rate,
            self.sector_relative_performance,
            self.sector_avg_return,
            self.industry_relative_performance,
            self.industry_avg_return,
            self.pe_vs_sector_avg,
            self.max_drawdown,
            self.sharpe_ratio,
            self.value_at_risk_5,
            self.return_skewness,
            self.return_kurtosis,
        ];
        always.iter().any(|v| !v.is_finite())
            || optional.iter().flatten().any(|v| !v.is_finite())
    }
}
