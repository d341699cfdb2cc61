//! Batch transform orchestration for the psx enrichment pipeline.
//!
//! One `transform` call:
//! 1. Validates the raw batch and collects per-record rejection reports
//! 2. Computes per-record basic metrics
//! 3. Groups records by ticker and sorts each series by date
//! 4. Runs the per-ticker time-series and risk phases, optionally on a
//!    rayon worker pool (each series is independent data)
//! 5. Runs the cross-sectional sector/industry pass over the whole batch
//! 6. Stamps, serializes, and sanitizes every output record
//!
//! The call is stateless: identical records, config, and timestamp yield
//! bit-identical output.

pub mod sanitize;

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use psx_core::{
    CleanRecord, EnrichedRecord, Error, Result, TransformConfig, TRANSFORMATION_VERSION,
};
use psx_features::{annotate_cross_section, annotate_series, basic};
use psx_ingestion::RecordValidator;
use psx_risk::RiskCalculator;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

/// Batch-level counters from one transform invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Raw records received.
    pub input_records: usize,
    /// Records that passed validation and were enriched.
    pub accepted: usize,
    /// Records rejected during validation.
    pub rejected: usize,
    /// Distinct tickers in the accepted set.
    pub tickers: usize,
}

/// Enriched batch plus per-record rejection reports.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Enriched records, grouped by ticker (alphabetical) and
    /// date-ascending within each ticker.
    pub records: Vec<Value>,
    /// One human-readable line per rejected input record (index + reason).
    pub errors: Vec<String>,
    /// Batch counters.
    pub stats: TransformStats,
}

/// Transform a raw record batch, stamping the current wall-clock time.
pub fn transform(records: &[Value], config: &TransformConfig) -> Result<TransformOutput> {
    transform_at(records, config, Utc::now())
}

/// Transform a raw record batch, stamping `now` onto every output record.
pub fn transform_at(
    records: &[Value],
    config: &TransformConfig,
    now: DateTime<Utc>,
) -> Result<TransformOutput> {
    config.validate()?;

    if records.len() > config.limits.max_batch_size {
        return Err(Error::BatchTooLarge {
            len: records.len(),
            max: config.limits.max_batch_size,
        });
    }

    let mut validator = RecordValidator::new();
    let (clean, errors) = validator.validate_batch(records);
    if clean.is_empty() {
        return Err(Error::BatchEmpty {
            rejected: errors.len(),
        });
    }

    let mut groups = group_by_ticker(clean);
    let stats = TransformStats {
        input_records: records.len(),
        accepted: groups.iter().map(|(_, series)| series.len()).sum(),
        rejected: errors.len(),
        tickers: groups.len(),
    };

    run_ticker_phases(&mut groups, config);

    // Barrier: group means span every ticker, so the per-ticker phases
    // must have finished for the whole batch first.
    let mut batch: Vec<EnrichedRecord> = groups
        .into_iter()
        .flat_map(|(_, series)| series)
        .collect();
    if config.features.sector_analysis {
        annotate_cross_section(&mut batch);
    }

    let records = serialize_batch(&batch, now)?;

    info!(
        input = stats.input_records,
        accepted = stats.accepted,
        rejected = stats.rejected,
        tickers = stats.tickers,
        "transform complete"
    );

    Ok(TransformOutput {
        records,
        errors,
        stats,
    })
}

/// Enrich each clean record with its basic metrics and group into
/// alphabetically ordered, date-sorted per-ticker series.
fn group_by_ticker(clean: Vec<CleanRecord>) -> Vec<(String, Vec<EnrichedRecord>)> {
    let mut groups: BTreeMap<String, Vec<EnrichedRecord>> = BTreeMap::new();
    for record in clean {
        groups
            .entry(record.ticker.clone())
            .or_default()
            .push(basic::enrich(record));
    }

    let mut grouped: Vec<_> = groups.into_iter().collect();
    for (_, series) in &mut grouped {
        series.sort_by_key(|r| r.base.date);
    }
    grouped
}

/// Run the time-series and risk phases over every ticker's series.
///
/// Each series is independently owned, so the parallel path hands one
/// series to each rayon task with no shared mutable state.
fn run_ticker_phases(groups: &mut [(String, Vec<EnrichedRecord>)], config: &TransformConfig) {
    let annotate = |series: &mut Vec<EnrichedRecord>| {
        if config.features.technical_indicators {
            annotate_series(&config.windows, series);
        }
        if config.features.risk_metrics {
            RiskCalculator::new().annotate_series(series);
        }
    };

    if config.limits.parallel {
        groups.par_iter_mut().for_each(|(_, series)| annotate(series));
    } else {
        groups.iter_mut().for_each(|(_, series)| annotate(series));
    }
}

/// Stamp, serialize, and sanitize the enriched batch.
fn serialize_batch(batch: &[EnrichedRecord], now: DateTime<Utc>) -> Result<Vec<Value>> {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut out = Vec::with_capacity(batch.len());
    for record in batch {
        if record.has_non_finite() {
            warn!(
                ticker = %record.base.ticker,
                date = %record.base.date,
                "non-finite metric in enriched record; serializing as null"
            );
        }

        let mut value = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "transformation_timestamp".to_string(),
                Value::String(timestamp.clone()),
            );
            map.insert(
                "transformation_version".to_string(),
                Value::String(TRANSFORMATION_VERSION.to_string()),
            );
        }
        sanitize::sanitize(&mut value);
        out.push(value);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn make_raw(ticker: &str, date: &str, open: f64, close: f64, volume: i64) -> Value {
        json!({
            "Ticker": ticker,
            "Date": date,
            "Open": open,
            "High": open.max(close) + 1.0,
            "Low": open.min(close) - 1.0,
            "Close": close,
            "Volume": volume,
        })
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_transform_two_record_series() {
        let records = vec![
            make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000),
            make_raw("AAPL", "2024-01-02", 154.0, 157.0, 1_100_000),
        ];
        let config = TransformConfig::default();

        let output = transform_at(&records, &config, fixed_now()).unwrap();
        assert_eq!(output.records.len(), 2);
        assert!(output.errors.is_empty());
        assert_eq!(output.stats.accepted, 2);
        assert_eq!(output.stats.tickers, 1);

        // Short-window mean is defined from the first record onward.
        assert_eq!(output.records[0]["MA_short"], json!(154.0));
        assert_eq!(output.records[1]["MA_short"], json!(155.5));
        // Everything gated on the short window stays null.
        assert_eq!(output.records[0]["MA_long"], json!(null));
        assert_eq!(output.records[1]["RSI"], json!(null));
        assert_eq!(output.records[1]["Volatility_short"], json!(null));
    }

    #[test]
    fn test_output_is_stamped() {
        let records = vec![make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000)];
        let config = TransformConfig::default();

        let output = transform_at(&records, &config, fixed_now()).unwrap();
        assert_eq!(
            output.records[0]["transformation_timestamp"],
            json!("2024-01-15T12:00:00Z")
        );
        assert_eq!(
            output.records[0]["transformation_version"],
            json!(TRANSFORMATION_VERSION)
        );
    }

    #[test]
    fn test_output_grouped_and_date_sorted() {
        let records = vec![
            make_raw("MSFT", "2024-01-02", 400.0, 405.0, 500_000),
            make_raw("AAPL", "2024-01-02", 154.0, 157.0, 1_100_000),
            make_raw("MSFT", "2024-01-01", 398.0, 400.0, 480_000),
            make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000),
        ];
        let config = TransformConfig::default();

        let output = transform_at(&records, &config, fixed_now()).unwrap();
        let keys: Vec<(String, String)> = output
            .records
            .iter()
            .map(|r| {
                (
                    r["Ticker"].as_str().unwrap().to_string(),
                    r["Date"].as_str().unwrap().to_string(),
                )
            })
            .collect();

        assert_eq!(keys[0].0, "AAPL");
        assert_eq!(keys[1].0, "AAPL");
        assert_eq!(keys[2].0, "MSFT");
        assert_eq!(keys[3].0, "MSFT");
        assert!(keys[0].1 < keys[1].1);
        assert!(keys[2].1 < keys[3].1);
    }

    #[test]
    fn test_rejected_records_reported_not_fatal() {
        let records = vec![
            make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000),
            json!({"Ticker": "AAPL"}),
        ];
        let config = TransformConfig::default();

        let output = transform_at(&records, &config, fixed_now()).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.errors.len(), 1);
        assert!(output.errors[0].starts_with("record 1"));
    }

    #[test]
    fn test_all_rejected_is_an_error() {
        let records = vec![json!({"Ticker": "AAPL"}), json!(42)];
        let config = TransformConfig::default();

        match transform_at(&records, &config, fixed_now()) {
            Err(Error::BatchEmpty { rejected }) => assert_eq!(rejected, 2),
            other => panic!("expected BatchEmpty, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_ceiling() {
        let records = vec![
            make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000),
            make_raw("AAPL", "2024-01-02", 154.0, 157.0, 1_100_000),
        ];
        let mut config = TransformConfig::default();
        config.limits.max_batch_size = 1;

        match transform_at(&records, &config, fixed_now()) {
            Err(Error::BatchTooLarge { len, max }) => {
                assert_eq!(len, 2);
                assert_eq!(max, 1);
            }
            other => panic!("expected BatchTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_toggles_skip_phases() {
        let records = vec![make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000)];
        let mut config = TransformConfig::default();
        config.features.technical_indicators = false;
        config.features.sector_analysis = false;
        config.features.risk_metrics = false;

        let output = transform_at(&records, &config, fixed_now()).unwrap();
        let record = &output.records[0];
        // Basic metrics are never toggled off.
        assert!(record["Daily_Return"].is_f64());
        assert_eq!(record["MA_short"], json!(null));
        assert_eq!(record["Sector_Avg_Return"], json!(null));
        assert_eq!(record["Max_Drawdown"], json!(null));
    }

    #[test]
    fn test_output_rounded_to_four_decimals() {
        let records = vec![make_raw("AAPL", "2024-01-01", 3.0, 10.0, 1_000_000)];
        let config = TransformConfig::default();

        let output = transform_at(&records, &config, fixed_now()).unwrap();
        // (10 - 3) / 3 * 100 rounds to 233.3333.
        assert_eq!(output.records[0]["Daily_Return"], json!(233.3333));
    }

    #[test]
    fn test_determinism() {
        let records = vec![
            make_raw("AAPL", "2024-01-01", 150.0, 154.0, 1_000_000),
            make_raw("MSFT", "2024-01-01", 398.0, 400.0, 480_000),
        ];
        let config = TransformConfig::default();

        let first = transform_at(&records, &config, fixed_now()).unwrap();
        let second = transform_at(&records, &config, fixed_now()).unwrap();
        assert_eq!(first.records, second.records);
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut records = Vec::new();
        for day in 1..=20 {
            records.push(make_raw(
                "AAPL",
                &format!("2024-01-{day:02}"),
                150.0 + day as f64,
                151.0 + day as f64,
                1_000_000,
            ));
            records.push(make_raw(
                "MSFT",
                &format!("2024-01-{day:02}"),
                400.0 - day as f64,
                399.0 - day as f64,
                500_000,
            ));
        }

        let parallel = TransformConfig::default();
        let mut sequential = TransformConfig::default();
        sequential.limits.parallel = false;

        let a = transform_at(&records, &parallel, fixed_now()).unwrap();
        let b = transform_at(&records, &sequential, fixed_now()).unwrap();
        assert_eq!(a.records, b.records);
    }
}
