//! Funding-spread scan loop (spec.md §4.6.3). Same shape as
//! [`crate::price_loop`]; differs in funding mode and in the primary
//! pre-evaluation filter, which gates on the long leg's funding rate rather
//! than the price spread. Acceptance (`fundingSpreadPct >= MIN_FUNDING_SPREAD`
//! and `minutesUntilFunding(long) < MIN_TIME_TO_PAY`) is enforced inside
//! [`arb_evaluator::evaluate`]'s funding-arb early-reject, not duplicated
//! here.

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

#[allow(clippy::too_many_arguments)]
pub async fn run_funding_spread_batch(
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
            let Some(funding_long) = long.funding_rate else { continue };
            if funding_long > loop_config.min_funding_long_filter_for_log {
                continue;
            }
            for (j, short) in legs.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (Some(long_adapter), Some(short_adapter)) = (registry.get(long.venue).cloned(), registry.get(short.venue).cloned()) else {
                    continue;
                };
                pair_futures.push(evaluate_pair(
                    coin.clone(),
                    long.clone(),
                    short.clone(),
                    FundingMode::FundingArb,
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
    info!(%coin, count = favorable.len(), "funding-spread opportunities found");
    let mut text = format!("{coin}: {} funding-spread opportunity(ies)\n", favorable.len());
    for opportunity in favorable {
        let funding = opportunity.funding_spread_pct.map(|f| format!("{f:.3}%")).unwrap_or_else(|| "n/a".into());
        let minutes = opportunity.minutes_until_funding.map(|m| format!("{m} min")).unwrap_or_else(|| "unknown".into());
        text.push_str(&format!(
            "Long ({}), Short ({}): funding spread {funding} | pays in {minutes}\n",
            venue_label(opportunity.long_venue),
            venue_label(opportunity.short_venue),
        ));
    }
    sink.emit_message(channel, &text).await;
}

fn venue_label(venue: VenueId) -> &'static str {
    venue.as_str()
}
