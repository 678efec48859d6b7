//! Scanner Loops (spec.md §4.6): coin universe collection feeding two
//! independent cycles — price-spread and funding-spread — each batched,
//! bounded-concurrency, and run on a fixed interval.

pub mod config;
pub mod funding_loop;
pub mod legs;
pub mod price_loop;
pub mod universe;

pub use config::ScannerLoopConfig;

use arb_core::Sink;
use arb_evaluator::EvaluatorConfig;
use arb_news::budget::PrefetchBudget;
use arb_news::NewsEngine;
use arb_venues::VenueRegistry;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument};

/// One full scan cycle (spec.md §4.6.1-§4.6.3): collect the coin universe,
/// then run the price-spread and funding-spread loops over it in batches of
/// `coin_batch_size`. Both loops share one `MAX_CONCURRENCY` scan semaphore,
/// one `ANALYSIS_MAX_CONCURRENCY` analysis semaphore, and one prefetch
/// budget for the whole cycle.
#[instrument(skip_all)]
pub async fn run_cycle(
    registry: &VenueRegistry,
    loop_config: &ScannerLoopConfig,
    evaluator_config: &EvaluatorConfig,
    news: &NewsEngine,
    sink: &dyn Sink,
    channel: &str,
) {
    let universe = universe::collect_universe(registry, &loop_config.exclude_coins).await;
    let coins = universe::union_coins(&universe);
    info!(coin_count = coins.len(), "collected scan universe");

    let scan_semaphore = Arc::new(Semaphore::new(loop_config.max_concurrency));
    let analysis_semaphore = Arc::new(Semaphore::new(loop_config.analysis_max_concurrency));
    let budget = PrefetchBudget::new(loop_config.prefetch_budget_per_cycle);
    let now_ms = Utc::now().timestamp_millis();

    for batch in config::batches(&coins, loop_config.coin_batch_size) {
        price_loop::run_price_spread_batch(
            batch,
            registry,
            loop_config,
            evaluator_config,
            news,
            &scan_semaphore,
            &analysis_semaphore,
            &budget,
            sink,
            channel,
            now_ms,
        )
        .await;

        funding_loop::run_funding_spread_batch(
            batch,
            registry,
            loop_config,
            evaluator_config,
            news,
            &scan_semaphore,
            &analysis_semaphore,
            &budget,
            sink,
            channel,
            now_ms,
        )
        .await;
    }
}

/// Run [`run_cycle`] forever, sleeping `scan_interval_sec` after each
/// completion regardless of how long the cycle itself took (spec.md
/// §4.6.3 "the loop sleeps `SCAN_INTERVAL_SEC` after completion").
pub async fn run_forever(
    registry: &VenueRegistry,
    loop_config: &ScannerLoopConfig,
    evaluator_config: &EvaluatorConfig,
    news: &NewsEngine,
    sink: &dyn Sink,
    channel: &str,
) {
    loop {
        run_cycle(registry, loop_config, evaluator_config, news, sink, channel).await;
        tokio::time::sleep(std::time::Duration::from_secs(loop_config.scan_interval_sec)).await;
    }
}
