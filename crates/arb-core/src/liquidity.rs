use crate::market::{BookSide, OrderBook};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Which side(s) of the book a liquidity check requires depth on (spec.md
/// §4.5.2): entering a long needs buy-side (ask) depth, entering a short
/// needs sell-side (bid) depth, a round-trip needs both.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum LiquidityMode {
    EntryLong,
    EntryShort,
    RoundTrip,
}

impl LiquidityMode {
    pub fn needs_buy(&self) -> bool {
        matches!(self, LiquidityMode::EntryLong | LiquidityMode::RoundTrip)
    }

    pub fn needs_sell(&self) -> bool {
        matches!(self, LiquidityMode::EntryShort | LiquidityMode::RoundTrip)
    }
}

/// Outcome of `checkLiquidity` for one venue/coin/notional. Spec.md §8
/// invariant: if `ok`, `spread_bps <= max_spread_bps`, both VWAPs required by
/// `mode` are present, and required impact(s) are within `max_impact_bps`.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct LiquidityReport {
    pub mid: Option<Decimal>,
    pub bid1: Option<Decimal>,
    pub ask1: Option<Decimal>,
    pub spread_bps: Option<Decimal>,
    pub notional_usdt: Decimal,
    pub buy_vwap: Option<Decimal>,
    pub sell_vwap: Option<Decimal>,
    pub buy_impact_bps: Option<Decimal>,
    pub sell_impact_bps: Option<Decimal>,
    pub ok: bool,
    pub reasons: Vec<String>,
}

const DEPTH_EPSILON: Decimal = dec!(0.000001);
const FILLED_EPSILON: Decimal = dec!(0.000000001);
const BPS: Decimal = dec!(10000);

/// VWAP-for-notional (spec.md §4.5.2): walk `levels` from inside to outside,
/// consuming up to `notional` USDT. Returns `(None, filled_usd)` if the book
/// side didn't have enough depth, `(Some(vwap), notional)` otherwise.
pub fn vwap_for_notional(levels: &BookSide, notional: Decimal) -> (Option<Decimal>, Decimal) {
    if notional <= Decimal::ZERO {
        return (None, Decimal::ZERO);
    }

    let mut remaining = notional;
    let mut filled_usd = Decimal::ZERO;
    let mut filled_base = Decimal::ZERO;

    for (price, size) in levels {
        if *price <= Decimal::ZERO {
            continue;
        }
        let level_usd = price * size;
        let take = level_usd.min(remaining);
        filled_usd += take;
        filled_base += take / price;
        remaining -= take;
        if remaining <= DEPTH_EPSILON {
            break;
        }
    }

    if filled_base <= Decimal::ZERO {
        return (None, Decimal::ZERO);
    }
    if remaining > FILLED_EPSILON.max(dec!(0.000001)) {
        return (None, filled_usd);
    }
    (Some(filled_usd / filled_base), notional)
}

/// Full `checkLiquidity` evaluation against a normalized [`OrderBook`]
/// (spec.md §4.5.2). `notional = 0` trivially passes (spec.md §8 boundary
/// behaviour).
pub fn check_liquidity(
    book: &OrderBook,
    notional_usdt: Decimal,
    mode: LiquidityMode,
    max_spread_bps: Decimal,
    max_impact_bps: Decimal,
) -> LiquidityReport {
    let mut report = LiquidityReport {
        notional_usdt,
        ..Default::default()
    };

    if notional_usdt <= Decimal::ZERO {
        report.ok = true;
        return report;
    }

    let (Some((bid1, _)), Some((ask1, _))) = (book.bid1(), book.ask1()) else {
        report.reasons.push("missing top of book".into());
        return report;
    };
    let mid = (bid1 + ask1) / dec!(2);
    report.bid1 = Some(bid1);
    report.ask1 = Some(ask1);
    report.mid = Some(mid);

    if mid <= Decimal::ZERO {
        report.reasons.push("non-positive mid price".into());
        return report;
    }

    let spread_bps = (ask1 - bid1) / mid * BPS;
    report.spread_bps = Some(spread_bps);
    if spread_bps > max_spread_bps {
        report.reasons.push(format!(
            "spread {spread_bps}bps exceeds max {max_spread_bps}bps"
        ));
    }

    if mode.needs_buy() {
        let (vwap, _) = vwap_for_notional(&book.asks, notional_usdt);
        match vwap {
            Some(vwap) => {
                let impact = (vwap - ask1).abs() / mid * BPS;
                report.buy_vwap = Some(vwap);
                report.buy_impact_bps = Some(impact);
                if impact > max_impact_bps {
                    report
                        .reasons
                        .push(format!("buy impact {impact}bps exceeds max {max_impact_bps}bps"));
                }
            }
            None => report.reasons.push("insufficient buy-side depth".into()),
        }
    }

    if mode.needs_sell() {
        let (vwap, _) = vwap_for_notional(&book.bids, notional_usdt);
        match vwap {
            Some(vwap) => {
                let impact = (vwap - bid1).abs() / mid * BPS;
                report.sell_vwap = Some(vwap);
                report.sell_impact_bps = Some(impact);
                if impact > max_impact_bps {
                    report
                        .reasons
                        .push(format!("sell impact {impact}bps exceeds max {max_impact_bps}bps"));
                }
            }
            None => report.reasons.push("insufficient sell-side depth".into()),
        }
    }

    report.ok = report.reasons.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vwap_for_notional_zero_notional_returns_none_zero() {
        let levels = vec![(dec!(100), dec!(10))];
        assert_eq!(vwap_for_notional(&levels, dec!(0)), (None, Decimal::ZERO));
    }

    #[test]
    fn vwap_for_notional_exact_fill_matches_notional_within_tolerance() {
        let levels = vec![(dec!(100), dec!(10)), (dec!(101), dec!(10))];
        let (vwap, filled) = vwap_for_notional(&levels, dec!(1500));
        let vwap = vwap.expect("enough depth");
        // filled_base * vwap == notional to within 1e-6 relative error.
        let filled_base = dec!(10) + dec!(500) / dec!(101);
        let reconstructed = filled_base * vwap;
        assert!((reconstructed - filled).abs() / filled < dec!(0.000001));
    }

    #[test]
    fn vwap_for_notional_insufficient_depth_returns_none_with_partial_fill() {
        let levels = vec![(dec!(100), dec!(1))];
        let (vwap, filled_usd) = vwap_for_notional(&levels, dec!(1000));
        assert_eq!(vwap, None);
        assert_eq!(filled_usd, dec!(100));
    }

    #[test]
    fn check_liquidity_zero_notional_is_trivially_ok() {
        let book = OrderBook::default();
        let report = check_liquidity(&book, dec!(0), LiquidityMode::RoundTrip, dec!(30), dec!(50));
        assert!(report.ok);
    }

    #[test]
    fn check_liquidity_ok_implies_spread_and_impact_within_bounds() {
        let book = OrderBook {
            bids: vec![(dec!(100), dec!(100)), (dec!(99.9), dec!(100))],
            asks: vec![(dec!(100.05), dec!(100)), (dec!(100.2), dec!(100))],
        };
        let report = check_liquidity(&book, dec!(1000), LiquidityMode::RoundTrip, dec!(30), dec!(50));
        assert!(report.ok);
        assert!(report.spread_bps.unwrap() <= dec!(30));
        assert!(report.buy_vwap.is_some() && report.sell_vwap.is_some());
        assert!(report.buy_impact_bps.unwrap() <= dec!(50));
        assert!(report.sell_impact_bps.unwrap() <= dec!(50));
    }

    #[test]
    fn check_liquidity_rejects_when_depth_insufficient() {
        let book = OrderBook {
            bids: vec![(dec!(100), dec!(1))],
            asks: vec![(dec!(100.01), dec!(1))],
        };
        let report = check_liquidity(&book, dec!(1_000_000), LiquidityMode::EntryLong, dec!(30), dec!(50));
        assert!(!report.ok);
        assert!(report.reasons.iter().any(|r| r.contains("depth")));
    }
}
