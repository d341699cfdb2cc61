//! Per-record basic metrics.
//!
//! Pure functions of a single clean record; no cross-record state.

use psx_core::{CleanRecord, EnrichedRecord, MarketCapCategory};

/// Wrap a clean record and fill in every per-record metric.
pub fn enrich(record: CleanRecord) -> EnrichedRecord {
    let mut enriched = EnrichedRecord::from_clean(record);

    enriched.daily_return = enriched.base.daily_return();
    enriched.price_range = enriched.base.price_range();
    enriched.typical_price = enriched.base.typical_price();
    enriched.relative_volume = enriched.base.relative_volume();
    enriched.volume_weighted_price = enriched.typical_price * enriched.base.volume as f64;

    enriched.pe_growth = match (enriched.base.trailing_pe, enriched.base.forward_pe) {
        (Some(trailing), Some(forward)) => Some(trailing - forward),
        _ => None,
    };
    enriched.market_cap_category = enriched
        .base
        .market_cap
        .map(MarketCapCategory::from_market_cap);

    enriched
}
