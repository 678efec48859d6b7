//! Price-spread scan loop (spec.md §4.6.2).

use crate::config::ScannerLoopConfig;
use crate::legs::{evaluate_pair, fetch_legs};
use arb_core::{Coin, Opportunity, Sink, VenueId};
use arb_evaluator::{EvaluatorConfig, FundingMode};
use arb_news::budget::PrefetchBudget;
use arb_news::NewsEngine;
use arb_venues::VenueRegistry;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

/// One pass of the price-spread loop over `coins` (spec.md §4.6.2): fetch
/// tickers for every coin, keep ordered venue pairs whose price spread is
/// `>= min_spread`, evaluate the survivors, and emit one aggregated message
/// per coin with at least one favorable verdict.
#[allow(clippy::too_many_arguments)]
pub async fn run_price_spread_batch(
    coins: &[Coin],
    registry: &VenueRegistry,
    loop_config: &ScannerLoopConfig,
    evaluator_config: &EvaluatorConfig,
    news: &NewsEngine,
    scan_semaphore: &Arc<Semaphore>,
    analysis_semaphore: &Arc<Semaphore>,
    budget: &PrefetchBudget,
    sink: &dyn Sink,
    channel: &str,
    now_ms: i64,
) {
    for coin in coins {
        let legs = fetch_legs(coin, registry, scan_semaphore).await;
        if legs.len() < 2 {
            continue;
        }

        let mut pair_futures = Vec::new();
        for (i, long) in legs.iter().enumerate() {
            for (j, short) in legs.iter().enumerate() {
                if i == j {
                    continue;
                }
                let Some(spread) = arb_evaluator::price_spread_pct(long.ticker.ask, short.ticker.bid) else {
                    continue;
                };
                if spread < loop_config.min_spread {
                    continue;
                }
                let (Some(long_adapter), Some(short_adapter)) = (registry.get(long.venue).cloned(), registry.get(short.venue).cloned()) else {
                    continue;
                };
                pair_futures.push(evaluate_pair(
                    coin.clone(),
                    long.clone(),
                    short.clone(),
                    FundingMode::PriceArb,
                    long_adapter,
                    short_adapter,
                    news,
                    analysis_semaphore,
                    budget,
                    evaluator_config,
                    now_ms,
                ));
            }
        }

        let favorable: Vec<Opportunity> = futures::future::join_all(pair_futures).await.into_iter().flatten().collect();
        if !favorable.is_empty() {
            emit_aggregated(coin, &favorable, sink, channel).await;
        }
    }
}

async fn emit_aggregated(coin: &Coin, favorable: &[Opportunity], sink: &dyn Sink, channel: &str) {
    info!(%coin, count = favorable.len(), "price-spread opportunities found");
    let mut text = format!("{coin}: {} price-spread opportunity(ies)\n", favorable.len());
    for opportunity in favorable {
        text.push_str(&format!(
            "Long ({}), Short ({}): {:.3}%\n",
            venue_label(opportunity.long_venue),
            venue_label(opportunity.short_venue),
            opportunity.price_spread_pct,
        ));
    }
    sink.emit_message(channel, &text).await;
}

fn venue_label(venue: VenueId) -> &'static str {
    venue.as_str()
}
