//! Monitor-until-close loop (spec.md §4.7.4): poll both legs' tickers every
//! second, compute the closing spread and running PnL, and trigger a
//! reducing-order close when `|closingSpreadPct| <= closeThresholdPct`.

use arb_core::{Sink, Ticker, VenueId};
use arb_venues::VenueAdapter;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug)]
pub struct OpenPrices {
    pub ask_long_open: Decimal,
    pub bid_short_open: Decimal,
}

/// `(closingSpreadPct, openingSpreadPct, pnlLong, pnlShort, pnlTotal)` for
/// one monitoring tick (spec.md §4.7.4).
#[derive(Clone, Copy, Debug)]
pub struct MonitorTick {
    pub closing_spread_pct: Decimal,
    pub opening_spread_pct: Decimal,
    pub pnl_long: Decimal,
    pub pnl_short: Decimal,
    pub pnl_total: Decimal,
}

/// `closingSpreadPct = (bidLong - askShort) / askShort * 100`.
pub fn closing_spread_pct(bid_long: Decimal, ask_short: Decimal) -> Option<Decimal> {
    if ask_short == Decimal::ZERO {
        return None;
    }
    Some((bid_long - ask_short) / ask_short * Decimal::from(100))
}

/// `openingSpreadPct = (askLong - bidShort) / bidShort * 100`, fixed as-of
/// open; recomputed here from the open snapshot for display (spec.md
/// §4.7.4).
pub fn opening_spread_pct(ask_long: Decimal, bid_short: Decimal) -> Option<Decimal> {
    if bid_short == Decimal::ZERO {
        return None;
    }
    Some((ask_long - bid_short) / bid_short * Decimal::from(100))
}

/// `pnlLong = (bidLongNow - askLongOpen) * qty - feeLong`,
/// `pnlShort = (bidShortOpen - askShortNow) * qty - feeShort` (spec.md
/// §4.7.4).
pub fn pnl_usdt(qty: Decimal, open: OpenPrices, bid_long_now: Decimal, ask_short_now: Decimal, fee_long: Decimal, fee_short: Decimal) -> (Decimal, Decimal, Decimal) {
    let pnl_long = (bid_long_now - open.ask_long_open) * qty - fee_long;
    let pnl_short = (open.bid_short_open - ask_short_now) * qty - fee_short;
    (pnl_long, pnl_short, pnl_long + pnl_short)
}

pub fn compute_tick(qty: Decimal, open: OpenPrices, long: Ticker, short: Ticker, fee_long: Decimal, fee_short: Decimal) -> Option<MonitorTick> {
    let closing_spread_pct = closing_spread_pct(long.bid, short.ask)?;
    let opening_spread_pct = opening_spread_pct(open.ask_long_open, open.bid_short_open)?;
    let (pnl_long, pnl_short, pnl_total) = pnl_usdt(qty, open, long.bid, short.ask, fee_long, fee_short);
    Some(MonitorTick {
        closing_spread_pct,
        opening_spread_pct,
        pnl_long,
        pnl_short,
        pnl_total,
    })
}

pub enum MonitorOutcome {
    /// `|closingSpreadPct| <= close_threshold_pct`; caller should place
    /// reducing orders.
    ThresholdReached(MonitorTick),
    /// Monitoring was cancelled (root task cancellation, spec.md §5).
    Cancelled,
}

/// Poll every second until the close threshold is reached or the monitor is
/// cancelled via `stop`. `close_threshold_pct = None` monitors indefinitely
/// without triggering a close (mirrors the original's "no threshold"
/// monitoring mode).
#[allow(clippy::too_many_arguments)]
pub async fn monitor_until_close(
    coin_label: &str,
    long_venue: VenueId,
    short_venue: VenueId,
    long_adapter: &Arc<dyn VenueAdapter>,
    short_adapter: &Arc<dyn VenueAdapter>,
    coin: &arb_core::Coin,
    qty: Decimal,
    open: OpenPrices,
    close_threshold_pct: Option<Decimal>,
    fee_long: Decimal,
    fee_short: Decimal,
    poll_interval: Duration,
    sink: &dyn Sink,
    sink_channel: &str,
    mut stop: tokio::sync::watch::Receiver<bool>,
) -> MonitorOutcome {
    loop {
        if *stop.borrow() {
            return MonitorOutcome::Cancelled;
        }

        let (long_ticker, short_ticker) = tokio::join!(long_adapter.get_futures_ticker(coin), short_adapter.get_futures_ticker(coin));
        let long_ticker = match long_ticker {
            Ok(Some(t)) => t,
            Ok(None) => {
                debug!(%coin_label, %long_venue, "monitor: ticker unavailable this tick");
                sleep_or_stop(poll_interval, &mut stop).await;
                continue;
            }
            Err(e) => {
                warn!(%coin_label, %long_venue, error = %e, "monitor: long ticker fetch failed");
                sleep_or_stop(poll_interval, &mut stop).await;
                continue;
            }
        };
        let short_ticker = match short_ticker {
            Ok(Some(t)) => t,
            Ok(None) => {
                debug!(%coin_label, %short_venue, "monitor: ticker unavailable this tick");
                sleep_or_stop(poll_interval, &mut stop).await;
                continue;
            }
            Err(e) => {
                warn!(%coin_label, %short_venue, error = %e, "monitor: short ticker fetch failed");
                sleep_or_stop(poll_interval, &mut stop).await;
                continue;
            }
        };

        if let Some(tick) = compute_tick(qty, open, long_ticker, short_ticker, fee_long, fee_short) {
            debug!(
                %coin_label, closing = %tick.closing_spread_pct, opening = %tick.opening_spread_pct, pnl = %tick.pnl_total,
                "monitor tick"
            );

            if let Some(threshold) = close_threshold_pct {
                if tick.closing_spread_pct.abs() <= threshold {
                    sink.emit_message(
                        sink_channel,
                        &format!(
                            "Порог закрытия достигнут: {coin_label} | закрытие {:.3}% (порог {:.3}%) | PNL {:.3} USDT",
                            tick.closing_spread_pct, threshold, tick.pnl_total
                        ),
                    )
                    .await;
                    return MonitorOutcome::ThresholdReached(tick);
                }
            }
        }

        sleep_or_stop(poll_interval, &mut stop).await;
    }
}

async fn sleep_or_stop(interval: Duration, stop: &mut tokio::sync::watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(interval) => {}
        _ = stop.changed() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn closing_spread_matches_formula() {
        let spread = closing_spread_pct(dec!(29990), dec!(30000)).unwrap();
        assert_eq!(spread, (dec!(29990) - dec!(30000)) / dec!(30000) * dec!(100));
    }

    #[test]
    fn pnl_usdt_sums_both_legs() {
        let open = OpenPrices {
            ask_long_open: dec!(100),
            bid_short_open: dec!(102),
        };
        let (pnl_long, pnl_short, total) = pnl_usdt(dec!(10), open, dec!(101), dec!(101), dec!(0.05), dec!(0.05));
        assert_eq!(pnl_long, (dec!(101) - dec!(100)) * dec!(10) - dec!(0.05));
        assert_eq!(pnl_short, (dec!(102) - dec!(101)) * dec!(10) - dec!(0.05));
        assert_eq!(total, pnl_long + pnl_short);
    }

    #[test]
    fn closing_spread_none_on_zero_ask() {
        assert_eq!(closing_spread_pct(dec!(100), dec!(0)), None);
    }
}
