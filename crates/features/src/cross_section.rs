//! Cross-sectional sector and industry benchmarking.
//!
//! Runs once over the whole batch, after every ticker's time-series pass has
//! completed: group means span the full cross-ticker record set.

use psx_core::EnrichedRecord;
use std::collections::HashMap;
use tracing::debug;

/// Mean per group name, skipping groups with no contributing members.
#[derive(Debug, Default)]
struct GroupMeans {
    sums: HashMap<String, (f64, usize)>,
}

impl GroupMeans {
    fn add(&mut self, group: &str, value: f64) {
        let entry = self.sums.entry(group.to_string()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    fn mean(&self, group: &str) -> Option<f64> {
        self.sums
            .get(group)
            .map(|&(sum, count)| sum / count as f64)
    }
}

/// Annotate every record with sector/industry benchmarking fields.
pub fn annotate_cross_section(records: &mut [EnrichedRecord]) {
    let mut sector_returns = GroupMeans::default();
    let mut industry_returns = GroupMeans::default();
    let mut sector_pe = GroupMeans::default();

    for record in records.iter() {
        if let Some(sector) = &record.base.sector {
            sector_returns.add(sector, record.daily_return);
            if let Some(pe) = record.base.trailing_pe {
                sector_pe.add(sector, pe);
            }
        }
        if let Some(industry) = &record.base.industry {
            industry_returns.add(industry, record.daily_return);
        }
    }
    debug!(
        sectors = sector_returns.sums.len(),
        industries = industry_returns.sums.len(),
        "cross-sectional group means computed"
    );

    for record in records.iter_mut() {
        if let Some(mean) = record
            .base
            .sector
            .as_deref()
            .and_then(|s| sector_returns.mean(s))
        {
            record.sector_relative_performance = Some(record.daily_return - mean);
            record.sector_avg_return = Some(mean);
        }
        if let Some(mean) = record
            .base
            .industry
            .as_deref()
            .and_then(|i| industry_returns.mean(i))
        {
            record.industry_relative_performance = Some(record.daily_return - mean);
            record.industry_avg_return = Some(mean);
        }

        record.pe_vs_sector_avg = match (
            record.base.trailing_pe,
            record.base.sector.as_deref().and_then(|s| sector_pe.mean(s)),
        ) {
            (Some(pe), Some(mean)) if mean > 0.0 => Some(pe / mean),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use psx_core::CleanRecord;

    fn make_record(
        ticker: &str,
        close: f64,
        sector: Option<&str>,
        industry: Option<&str>,
        trailing_pe: Option<f64>,
    ) -> EnrichedRecord {
        basic::enrich(CleanRecord {
            ticker: ticker.to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            open: 100.0,
            high: close.max(100.0) + 1.0,
            low: close.min(100.0) - 1.0,
            close,
            volume: 1_000_000,
            dividend: 0.0,
            sector: sector.map(String::from),
            industry: industry.map(String::from),
            market_cap: None,
            trailing_pe,
            forward_pe: None,
            dividend_yield: None,
            dividend_rate: None,
            average_volume: None,
            previous_close: None,
        })
    }

    #[test]
    fn test_sector_relative_performance() {
        // Daily returns: 2% and 4% in the same sector, mean 3%.
        let mut records = vec![
            make_record("AAA", 102.0, Some("Tech"), None, None),
            make_record("BBB", 104.0, Some("Tech"), None, None),
        ];
        annotate_cross_section(&mut records);

        assert_relative_eq!(records[0].sector_avg_return.unwrap(), 3.0, epsilon = 1e-10);
        assert_relative_eq!(
            records[0].sector_relative_performance.unwrap(),
            -1.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(
            records[1].sector_relative_performance.unwrap(),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_single_member_sector_is_zero() {
        let mut records = vec![make_record("AAA", 105.0, Some("Energy"), None, None)];
        annotate_cross_section(&mut records);

        assert_relative_eq!(records[0].sector_relative_performance.unwrap(), 0.0);
        assert_relative_eq!(
            records[0].sector_avg_return.unwrap(),
            5.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_missing_sector_yields_null() {
        let mut records = vec![
            make_record("AAA", 102.0, None, None, None),
            make_record("BBB", 104.0, Some("Tech"), None, None),
        ];
        annotate_cross_section(&mut records);

        assert!(records[0].sector_relative_performance.is_none());
        assert!(records[0].sector_avg_return.is_none());
        assert!(records[1].sector_relative_performance.is_some());
    }

    #[test]
    fn test_industry_groups_are_independent() {
        let mut records = vec![
            make_record("AAA", 102.0, Some("Tech"), Some("Semis"), None),
            make_record("BBB", 104.0, Some("Tech"), Some("Software"), None),
        ];
        annotate_cross_section(&mut records);

        // Each industry has a single member: relative performance 0.
        assert_relative_eq!(records[0].industry_relative_performance.unwrap(), 0.0);
        assert_relative_eq!(records[1].industry_relative_performance.unwrap(), 0.0);
        // While the shared sector mean is 3%.
        assert_relative_eq!(records[0].sector_avg_return.unwrap(), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pe_vs_sector_avg() {
        let mut records = vec![
            make_record("AAA", 102.0, Some("Tech"), None, Some(20.0)),
            make_record("BBB", 104.0, Some("Tech"), None, Some(30.0)),
            make_record("CCC", 101.0, Some("Tech"), None, None),
        ];
        annotate_cross_section(&mut records);

        // Sector mean PE over contributing members = 25.
        assert_relative_eq!(records[0].pe_vs_sector_avg.unwrap(), 0.8, epsilon = 1e-10);
        assert_relative_eq!(records[1].pe_vs_sector_avg.unwrap(), 1.2, epsilon = 1e-10);
        // No own trailingPE: null, even though the sector mean exists.
        assert!(records[2].pe_vs_sector_avg.is_none());
    }
}
