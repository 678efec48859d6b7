//! Price-spread and funding-spread arithmetic (spec.md §4.5, steps 1-2).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Which of the two funding-spread formulas the evaluator applies.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FundingMode {
    /// `(fundingShort - fundingLong) x 100`.
    PriceArb,
    /// `(receivedOnLong - paidOnShort) x 100`.
    FundingArb,
}

/// `(bidShort - askLong) / askLong x 100`. `None` when `askLong` is
/// non-positive (no meaningful spread to compute).
pub fn price_spread_pct(ask_long: Decimal, bid_short: Decimal) -> Option<Decimal> {
    if ask_long <= Decimal::ZERO {
        return None;
    }
    Some((bid_short - ask_long) / ask_long * dec!(100))
}

/// Funding spread under `mode` (spec.md §4.5 step 2). `None` if either leg's
/// funding rate is unknown.
pub fn funding_spread_pct(funding_long: Option<Decimal>, funding_short: Option<Decimal>, mode: FundingMode) -> Option<Decimal> {
    let funding_long = funding_long?;
    let funding_short = funding_short?;
    Some(match mode {
        FundingMode::PriceArb => (funding_short - funding_long) * dec!(100),
        FundingMode::FundingArb => {
            let received_on_long = if funding_long < Decimal::ZERO { -funding_long } else { Decimal::ZERO };
            let paid_on_short = funding_short.abs();
            (received_on_long - paid_on_short) * dec!(100)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_spread_matches_worked_example() {
        // Bybit ask 30000, Gate bid 30600 -> 2.000% (spec.md §8 scenario 1).
        let spread = price_spread_pct(dec!(30000), dec!(30600)).unwrap();
        assert_eq!(spread, dec!(2));
    }

    #[test]
    fn price_spread_none_for_non_positive_ask() {
        assert_eq!(price_spread_pct(dec!(0), dec!(100)), None);
        assert_eq!(price_spread_pct(dec!(-1), dec!(100)), None);
    }

    #[test]
    fn funding_spread_price_arb_is_antisymmetric_under_leg_swap() {
        let forward = funding_spread_pct(Some(dec!(-0.02)), Some(dec!(0.0023)), FundingMode::PriceArb).unwrap();
        let reversed = funding_spread_pct(Some(dec!(0.0023)), Some(dec!(-0.02)), FundingMode::PriceArb).unwrap();
        assert_eq!(forward, -reversed);
    }

    #[test]
    fn funding_spread_price_arb_matches_worked_example() {
        // Long funding -2%, short funding 0.23% -> (0.23 - (-2.00))% = 2.23%.
        let spread = funding_spread_pct(Some(dec!(-0.02)), Some(dec!(0.0023)), FundingMode::PriceArb).unwrap();
        assert_eq!(spread, dec!(2.23));
    }

    #[test]
    fn funding_spread_funding_arb_matches_worked_example() {
        // Long funding -2%, short funding 0.23% -> receivedOnLong 2.00, paidOnShort 0.23 -> 1.77% (spec.md §8 scenario 2).
        let spread = funding_spread_pct(Some(dec!(-0.02)), Some(dec!(0.0023)), FundingMode::FundingArb).unwrap();
        assert_eq!(spread, dec!(1.77));
    }

    #[test]
    fn funding_spread_funding_arb_only_credits_negative_long_funding() {
        // Long funding positive (longs pay): receivedOnLong = 0.
        let spread = funding_spread_pct(Some(dec!(0.001)), Some(dec!(0.002)), FundingMode::FundingArb).unwrap();
        assert_eq!(spread, dec!(-0.2));
    }

    #[test]
    fn funding_spread_none_when_either_leg_missing() {
        assert_eq!(funding_spread_pct(None, Some(dec!(0.001)), FundingMode::PriceArb), None);
        assert_eq!(funding_spread_pct(Some(dec!(0.001)), None, FundingMode::FundingArb), None);
    }
}
