//! Scanner-loop-local thresholds (spec.md §6.4, §4.6). Mirrors
//! `arb_evaluator::EvaluatorConfig`'s split: `arb-app::config::ScannerConfig`
//! is the full operator-facing config, this is the slice the loops need.

use arb_core::{Coin, VenueId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct ScannerLoopConfig {
    /// `MIN_SPREAD`.
    pub min_spread: Decimal,
    /// `MIN_FUNDING_LONG_FILTER_FOR_LOG`, e.g. `-0.5` (%).
    pub min_funding_long_filter_for_log: Decimal,
    /// `MAX_PRICE_SPREAD`, upper bound on `|priceSpreadPct|` accepted for a
    /// funding-arb candidate (funding arb wants price-neutral legs).
    pub max_price_spread: Decimal,
    /// `SCAN_INTERVAL_SEC`.
    pub scan_interval_sec: u64,
    /// `COIN_BATCH_SIZE`.
    pub coin_batch_size: usize,
    /// `MAX_CONCURRENCY`, global per-venue HTTP fan-out bound.
    pub max_concurrency: usize,
    /// `ANALYSIS_MAX_CONCURRENCY`, default 2.
    pub analysis_max_concurrency: usize,
    /// Cap on article prefetches across one full scan cycle (both loops
    /// share the same budget instance).
    pub prefetch_budget_per_cycle: usize,
    pub exclude_coins: HashSet<Coin>,
    pub exclude_exchanges: HashSet<VenueId>,
}

impl Default for ScannerLoopConfig {
    fn default() -> Self {
        Self {
            min_spread: dec!(2),
            min_funding_long_filter_for_log: dec!(-0.5),
            max_price_spread: dec!(0.5),
            scan_interval_sec: 30,
            coin_batch_size: 20,
            max_concurrency: 16,
            analysis_max_concurrency: 2,
            prefetch_budget_per_cycle: 20,
            exclude_coins: HashSet::new(),
            exclude_exchanges: HashSet::new(),
        }
    }
}

/// Split `coins` into `chunk_size`-sized batches, preserving order
/// (spec.md §4.6.2/§4.6.3 "for each batch of coins").
pub fn batches(coins: &[Coin], chunk_size: usize) -> impl Iterator<Item = &[Coin]> {
    coins.chunks(chunk_size.max(1))
}
