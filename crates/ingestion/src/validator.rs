//! Raw record validation and normalization.
//!
//! Filters a batch of raw JSON mappings down to clean, canonical records:
//! uppercase 1-5 letter tickers, UTC ISO-8601 dates, positive prices rounded
//! to 4 decimals, and a consistent OHLC envelope. A rejected record never
//! aborts the batch; it is reported with its index and reason.

use chrono::{DateTime, Utc};
use psx_core::{round4, CleanRecord};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Why a raw record was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' is not numeric")]
    NotNumeric(&'static str),

    #[error("ticker '{0}' is not a valid 1-5 letter symbol")]
    BadTicker(String),

    #[error("date '{0}' is not a parseable ISO-8601 date")]
    BadDate(String),

    #[error("price field '{0}' must be positive")]
    NonPositivePrice(&'static str),

    #[error("Volume must be >= 0")]
    NegativeVolume,

    #[error("Volume must be a whole number")]
    FractionalVolume,

    #[error("OHLC consistency violated (requires low <= open, close <= high)")]
    InconsistentOhlc,
}

/// Statistics about batch validation quality.
#[derive(Debug, Clone, Default)]
pub struct ValidationStats {
    /// Total records inspected.
    pub total: u64,
    /// Records that passed validation.
    pub accepted: u64,
    /// Records dropped.
    pub rejected: u64,
    /// Rejections for missing or non-numeric required fields.
    pub bad_fields: u64,
    /// Rejections for malformed ticker symbols.
    pub bad_tickers: u64,
    /// Rejections for missing or unparseable dates.
    pub bad_dates: u64,
    /// Rejections for non-positive prices or negative volume.
    pub bad_values: u64,
    /// Rejections for an inconsistent OHLC envelope.
    pub inconsistent_ohlc: u64,
}

impl ValidationStats {
    /// Fraction of inspected records that were accepted.
    pub fn accept_rate(&self) -> f64 {
        if self.total > 0 {
            self.accepted as f64 / self.total as f64
        } else {
            0.0
        }
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn record(&mut self, reason: &RejectReason) {
        self.rejected += 1;
        match reason {
            RejectReason::NotAnObject
            | RejectReason::MissingField(_)
            | RejectReason::NotNumeric(_) => self.bad_fields += 1,
            RejectReason::BadTicker(_) => self.bad_tickers += 1,
            RejectReason::BadDate(_) => self.bad_dates += 1,
            RejectReason::NonPositivePrice(_)
            | RejectReason::NegativeVolume
            | RejectReason::FractionalVolume => self.bad_values += 1,
            RejectReason::InconsistentOhlc => self.inconsistent_ohlc += 1,
        }
    }
}

/// Validator that normalizes raw mappings into clean records.
#[derive(Debug, Default)]
pub struct RecordValidator {
    stats: ValidationStats,
}

impl RecordValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation statistics accumulated so far.
    pub fn stats(&self) -> &ValidationStats {
        &self.stats
    }

    /// Validate a whole batch.
    ///
    /// Returns the clean records plus one human-readable error string per
    /// rejected record, formatted as `record {index}: {reason}`.
    pub fn validate_batch(&mut self, records: &[Value]) -> (Vec<CleanRecord>, Vec<String>) {
        let mut clean = Vec::with_capacity(records.len());
        let mut errors = Vec::new();

        for (index, raw) in records.iter().enumerate() {
            self.stats.total += 1;
            match self.validate_record(raw) {
                Ok(record) => {
                    self.stats.accepted += 1;
                    clean.push(record);
                }
                Err(reason) => {
                    self.stats.record(&reason);
                    errors.push(format!("record {index}: {reason}"));
                }
            }
        }

        debug!(
            total = self.stats.total,
            accepted = self.stats.accepted,
            rejected = self.stats.rejected,
            "batch validation complete"
        );
        (clean, errors)
    }

    /// Validate and normalize a single raw mapping.
    pub fn validate_record(&self, raw: &Value) -> Result<CleanRecord, RejectReason> {
        let map = raw.as_object().ok_or(RejectReason::NotAnObject)?;

        let ticker = normalize_ticker(map)?;
        let date = normalize_date(map)?;

        let open = required_f64(map, "Open")?;
        let high = required_f64(map, "High")?;
        let low = required_f64(map, "Low")?;
        let close = required_f64(map, "Close")?;
        let volume = required_f64(map, "Volume")?;

        for (name, price) in [("Open", open), ("High", high), ("Low", low), ("Close", close)] {
            if price <= 0.0 {
                return Err(RejectReason::NonPositivePrice(name));
            }
        }
        if volume < 0.0 {
            return Err(RejectReason::NegativeVolume);
        }
        if volume.fract() != 0.0 {
            return Err(RejectReason::FractionalVolume);
        }
        if !(low <= open && open <= high && low <= close && close <= high) {
            return Err(RejectReason::InconsistentOhlc);
        }

        Ok(CleanRecord {
            ticker,
            date,
            open: round4(open),
            high: round4(high),
            low: round4(low),
            close: round4(close),
            volume: volume as i64,
            dividend: round4(optional_f64(map, "Dividend").unwrap_or(0.0)),
            sector: optional_string(map, "sector"),
            industry: optional_string(map, "industry"),
            market_cap: optional_f64(map, "marketCap"),
            trailing_pe: optional_f64(map, "trailingPE"),
            forward_pe: optional_f64(map, "forwardPE"),
            dividend_yield: optional_f64(map, "dividendYield"),
            dividend_rate: optional_f64(map, "dividendRate"),
            average_volume: optional_f64(map, "averageVolume"),
            previous_close: optional_f64(map, "previousClose"),
        })
    }
}

/// Trim, uppercase, and check the `[A-Z]{1,5}` symbol pattern.
fn normalize_ticker(map: &Map<String, Value>) -> Result<String, RejectReason> {
    let raw = match map.get("Ticker") {
        Some(Value::String(s)) => s.trim().to_uppercase(),
        _ => return Err(RejectReason::MissingField("Ticker")),
    };
    let valid = (1..=5).contains(&raw.len()) && raw.chars().all(|c| c.is_ascii_uppercase());
    if valid {
        Ok(raw)
    } else {
        Err(RejectReason::BadTicker(raw))
    }
}

/// Canonicalize the date to UTC.
///
/// Date-only values get `T00:00:00Z` appended; zoneless date-times get `Z`.
fn normalize_date(map: &Map<String, Value>) -> Result<DateTime<Utc>, RejectReason> {
    let raw = match map.get("Date") {
        Some(Value::String(s)) => s.trim(),
        _ => return Err(RejectReason::MissingField("Date")),
    };
    if raw.is_empty() {
        return Err(RejectReason::MissingField("Date"));
    }

    let candidate = if !raw.contains('T') {
        format!("{raw}T00:00:00Z")
    } else if has_zone(raw) {
        raw.to_string()
    } else {
        format!("{raw}Z")
    };

    DateTime::parse_from_rfc3339(&candidate)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RejectReason::BadDate(raw.to_string()))
}

/// True when the time portion carries `Z` or a numeric offset.
fn has_zone(s: &str) -> bool {
    match s.split_once('T') {
        Some((_, time)) => time.ends_with('Z') || time.contains('+') || time.contains('-'),
        None => false,
    }
}

fn required_f64(map: &Map<String, Value>, key: &'static str) -> Result<f64, RejectReason> {
    match map.get(key) {
        None | Some(Value::Null) => Err(RejectReason::MissingField(key)),
        Some(value) => coerce_f64(value)
            .filter(|v| v.is_finite())
            .ok_or(RejectReason::NotNumeric(key)),
    }
}

/// Non-critical numeric attribute; anything unusable stays absent.
fn optional_f64(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(coerce_f64).filter(|v| v.is_finite())
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Accept JSON numbers and numeric strings.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
