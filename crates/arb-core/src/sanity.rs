//! Sanity clamping applied to every venue's raw ticker before it enters the
//! rest of the system (spec.md §4.2 "Sanity clamp").

use crate::market::Ticker;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CLAMP_FACTOR: Decimal = dec!(10);
const SMALL_LAST_THRESHOLD: Decimal = dec!(0.0001);

/// Clamp a single side price `v` relative to `last`: if `v > last * 10` or
/// `v < last / 10`, replace with `last`. For very small `last` (< 1e-4), only
/// the upper bound applies (dividing by 10 would otherwise make the lower
/// bound meaningless at that scale).
pub fn clamp_side(v: Decimal, last: Decimal) -> Decimal {
    if last <= Decimal::ZERO {
        return v;
    }
    if v > last * CLAMP_FACTOR {
        return last;
    }
    if last >= SMALL_LAST_THRESHOLD && v < last / CLAMP_FACTOR {
        return last;
    }
    v
}

/// Apply the sanity clamp to a raw ticker, falling back `bid`/`ask` to
/// `price` when required, and guarantee `bid <= ask` afterwards by clamping
/// both to `price` if the raw values are inverted.
pub fn clamp_ticker(price: Decimal, bid: Decimal, ask: Decimal) -> Ticker {
    let mut bid = clamp_side(bid, price);
    let mut ask = clamp_side(ask, price);
    if bid > ask {
        bid = price;
        ask = price;
    }
    Ticker { price, bid, ask }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_side_replaces_values_more_than_10x_away() {
        assert_eq!(clamp_side(dec!(1000), dec!(10)), dec!(10));
        assert_eq!(clamp_side(dec!(0.5), dec!(10)), dec!(10));
        assert_eq!(clamp_side(dec!(11), dec!(10)), dec!(11));
    }

    #[test]
    fn clamp_side_skips_lower_bound_for_tiny_last() {
        // last below 1e-4: only the upper bound applies.
        assert_eq!(clamp_side(dec!(0.000001), dec!(0.00005)), dec!(0.000001));
        assert_eq!(clamp_side(dec!(10), dec!(0.00005)), dec!(0.00005));
    }

    #[test]
    fn clamp_ticker_repairs_inverted_bid_ask() {
        let t = clamp_ticker(dec!(100), dec!(105), dec!(95));
        assert_eq!(t.bid, dec!(100));
        assert_eq!(t.ask, dec!(100));
        assert!(t.bid <= t.ask);
    }

    #[test]
    fn clamp_ticker_invariant_bid_le_ask_holds_for_valid_input() {
        let t = clamp_ticker(dec!(100), dec!(99.5), dec!(100.5));
        assert!(t.bid <= t.ask);
        assert_eq!(t.bid, dec!(99.5));
        assert_eq!(t.ask, dec!(100.5));
    }
}
