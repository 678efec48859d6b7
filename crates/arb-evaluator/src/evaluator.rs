//! Async orchestration for one `(coin, longVenue, shortVenue)` candidate
//! (spec.md §4.5): liquidity checks on both legs and news/risk lookups run
//! concurrently, then [`crate::verdict::assemble`] folds the results into a
//! [`Opportunity`].

use crate::config::EvaluatorConfig;
use crate::spread::{self, FundingMode};
use crate::verdict;
use arb_core::liquidity::LiquidityMode;
use arb_core::{Coin, Opportunity, Ticker, VenueError, VenueId};
use arb_core::opportunity::VenueLegData;
use arb_news::budget::PrefetchBudget;
use arb_news::NewsEngine;
use arb_venues::VenueAdapter;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Already-fetched per-venue inputs (spec.md §4.5: "Given (coin, longVenue,
/// shortVenue, longTicker, shortTicker)" — the scanner loop fetches tickers
/// and funding ahead of calling this, per §5's ordering guarantee).
#[derive(Clone)]
pub struct LegInput {
    pub venue: VenueId,
    pub ticker: Ticker,
    pub funding_rate: Option<Decimal>,
    pub next_funding_time_ms: Option<i64>,
}

#[allow(clippy::too_many_arguments)]
pub async fn evaluate(
    coin: &Coin,
    long: LegInput,
    short: LegInput,
    mode: FundingMode,
    long_adapter: &Arc<dyn VenueAdapter>,
    short_adapter: &Arc<dyn VenueAdapter>,
    news: &NewsEngine,
    budget: &PrefetchBudget,
    config: &EvaluatorConfig,
    now_ms: i64,
) -> Result<Opportunity, VenueError> {
    let price_spread_pct = spread::price_spread_pct(long.ticker.ask, short.ticker.bid);
    let funding_spread_pct = spread::funding_spread_pct(long.funding_rate, short.funding_rate, mode);
    let minutes_until_funding = long
        .next_funding_time_ms
        .and_then(|t| arb_core::time::minutes_until_funding(t, now_ms));

    if mode == FundingMode::FundingArb {
        if let Some(reason) = early_reject_reason(price_spread_pct, funding_spread_pct, minutes_until_funding, config) {
            debug!(coin = %coin, long = %long.venue, short = %short.venue, %reason, "funding-arb candidate rejected early");
            return Ok(rejected(coin, &long, &short, price_spread_pct, funding_spread_pct, minutes_until_funding, reason));
        }
    }

    let (liquidity_long, liquidity_short) = tokio::join!(
        long_adapter.check_liquidity(
            coin,
            config.notional_usdt,
            config.liquidity_depth,
            config.max_spread_bps,
            config.max_impact_bps,
            LiquidityMode::EntryLong,
        ),
        short_adapter.check_liquidity(
            coin,
            config.notional_usdt,
            config.liquidity_depth,
            config.max_spread_bps,
            config.max_impact_bps,
            LiquidityMode::EntryShort,
        ),
    );
    let liquidity_long = liquidity_long?;
    let liquidity_short = liquidity_short?;

    let (news_long, news_short) = tokio::join!(news.lookup(coin, long.venue, budget), news.lookup(coin, short.venue, budget));
    let news_long = news_long?;
    let news_short = news_short?;

    let (verdict, reasons) = verdict::assemble(liquidity_long.as_ref(), liquidity_short.as_ref(), &news_long, &news_short);

    Ok(Opportunity {
        coin: coin.clone(),
        long_venue: long.venue,
        short_venue: short.venue,
        price_spread_pct: price_spread_pct.unwrap_or_default(),
        funding_spread_pct,
        minutes_until_funding,
        long_data: VenueLegData {
            venue: long.venue,
            ticker: long.ticker,
            funding_rate: long.funding_rate,
            liquidity: liquidity_long,
        },
        short_data: VenueLegData {
            venue: short.venue,
            ticker: short.ticker,
            funding_rate: short.funding_rate,
            liquidity: liquidity_short,
        },
        verdict,
        reasons,
    })
}

fn early_reject_reason(
    price_spread_pct: Option<Decimal>,
    funding_spread_pct: Option<Decimal>,
    minutes_until_funding: Option<i64>,
    config: &EvaluatorConfig,
) -> Option<String> {
    if price_spread_pct.is_none() {
        return Some("price spread unavailable".into());
    }
    match funding_spread_pct {
        None => return Some("funding spread unavailable".into()),
        Some(spread) if spread < config.min_funding_spread => {
            return Some(format!("funding spread {spread}% below minimum {}%", config.min_funding_spread));
        }
        _ => {}
    }
    match minutes_until_funding {
        None => return Some("minutes until funding unknown".into()),
        Some(minutes) if minutes >= config.min_time_to_pay => {
            return Some(format!("funding in {minutes}m, at or beyond {}m cutoff", config.min_time_to_pay));
        }
        _ => {}
    }
    None
}

fn rejected(
    coin: &Coin,
    long: &LegInput,
    short: &LegInput,
    price_spread_pct: Option<Decimal>,
    funding_spread_pct: Option<Decimal>,
    minutes_until_funding: Option<i64>,
    reason: String,
) -> Opportunity {
    Opportunity {
        coin: coin.clone(),
        long_venue: long.venue,
        short_venue: short.venue,
        price_spread_pct: price_spread_pct.unwrap_or_default(),
        funding_spread_pct,
        minutes_until_funding,
        long_data: VenueLegData {
            venue: long.venue,
            ticker: long.ticker.clone(),
            funding_rate: long.funding_rate,
            liquidity: None,
        },
        short_data: VenueLegData {
            venue: short.venue,
            ticker: short.ticker.clone(),
            funding_rate: short.funding_rate,
            liquidity: None,
        },
        verdict: arb_core::Verdict::Rejected,
        reasons: vec![reason],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> EvaluatorConfig {
        EvaluatorConfig {
            min_funding_spread: dec!(1.5),
            min_time_to_pay: 60,
            ..EvaluatorConfig::default()
        }
    }

    #[test]
    fn early_reject_flags_missing_price_spread() {
        let reason = early_reject_reason(None, Some(dec!(2)), Some(10), &config());
        assert!(reason.unwrap().contains("price spread"));
    }

    #[test]
    fn early_reject_flags_funding_spread_below_minimum() {
        let reason = early_reject_reason(Some(dec!(1)), Some(dec!(1.0)), Some(10), &config());
        assert!(reason.unwrap().contains("funding spread"));
    }

    #[test]
    fn early_reject_flags_funding_too_far_out() {
        let reason = early_reject_reason(Some(dec!(1)), Some(dec!(2)), Some(120), &config());
        assert!(reason.unwrap().contains("cutoff"));
    }

    #[test]
    fn early_reject_passes_when_all_gates_clear() {
        let reason = early_reject_reason(Some(dec!(1)), Some(dec!(2)), Some(8), &config());
        assert!(reason.is_none());
    }
}
