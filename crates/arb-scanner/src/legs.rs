//! Per-coin ticker/funding fan-out and single-pair evaluation, shared by
//! both the price-spread and funding-spread loops (spec.md §4.6.2/§4.6.3).

use arb_core::Coin;
use arb_evaluator::evaluator::LegInput;
use arb_evaluator::{EvaluatorConfig, FundingMode};
use arb_news::budget::PrefetchBudget;
use arb_news::NewsEngine;
use arb_venues::{VenueAdapter, VenueRegistry};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Fetch `coin`'s ticker and funding info from every registered venue that
/// lists it, bounded by the global scan semaphore (`MAX_CONCURRENCY`).
/// Venues with no listing, a transient error, or missing bid/ask are
/// silently dropped (spec.md §7 "scanners never fail the outer loop").
pub async fn fetch_legs(coin: &Coin, registry: &VenueRegistry, scan_semaphore: &Arc<Semaphore>) -> Vec<LegInput> {
    let fetches = registry.iter().map(|adapter| {
        let adapter = adapter.clone();
        let coin = coin.clone();
        let scan_semaphore = scan_semaphore.clone();
        async move {
            let Ok(_permit) = scan_semaphore.acquire().await else {
                return None;
            };
            let ticker = match adapter.get_futures_ticker(&coin).await {
                Ok(Some(ticker)) => ticker,
                Ok(None) => return None,
                Err(e) => {
                    debug!(%coin, venue = %adapter.venue(), error = %e, "ticker fetch failed");
                    return None;
                }
            };
            let funding_info = adapter.get_funding_info(&coin).await.ok().flatten();
            Some(LegInput {
                venue: adapter.venue(),
                ticker,
                funding_rate: funding_info.as_ref().map(|f| f.rate),
                next_funding_time_ms: funding_info.and_then(|f| f.next_funding_time_ms),
            })
        }
    });
    futures::future::join_all(fetches).await.into_iter().flatten().collect()
}

/// Evaluate one ordered `(long, short)` pair, bounded by the analysis
/// semaphore (`ANALYSIS_MAX_CONCURRENCY`). Returns `None` for non-favorable
/// verdicts and evaluator errors (logged, not propagated).
#[allow(clippy::too_many_arguments)]
pub async fn evaluate_pair(
    coin: Coin,
    long: LegInput,
    short: LegInput,
    mode: FundingMode,
    long_adapter: Arc<dyn VenueAdapter>,
    short_adapter: Arc<dyn VenueAdapter>,
    news: &NewsEngine,
    analysis_semaphore: &Arc<Semaphore>,
    budget: &PrefetchBudget,
    evaluator_config: &EvaluatorConfig,
    now_ms: i64,
) -> Option<arb_core::Opportunity> {
    let Ok(_permit) = analysis_semaphore.acquire().await else {
        return None;
    };
    let (long_venue, short_venue) = (long.venue, short.venue);
    let opportunity = arb_evaluator::evaluate(
        &coin,
        long,
        short,
        mode,
        &long_adapter,
        &short_adapter,
        news,
        budget,
        evaluator_config,
        now_ms,
    )
    .await;

    match opportunity {
        Ok(opportunity) if opportunity.verdict.is_favorable() => Some(opportunity),
        Ok(_) => None,
        Err(e) => {
            debug!(%coin, long = %long_venue, short = %short_venue, error = %e, "evaluator error");
            None
        }
    }
}
