use crate::symbol::{Coin, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-of-book snapshot. Invariant (enforced by [`crate::sanity::clamp_ticker`]):
/// `0 < bid <= ask`, and any side differing from `price` by more than 10x is
/// rewritten to `price`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
}

/// `{rate, nextFundingTimeMs}`. Positive rate means longs pay shorts.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundingInfo {
    pub rate: Decimal,
    pub next_funding_time_ms: Option<i64>,
}

/// One side of an order book, sorted canonically: bids descending by price,
/// asks ascending by price. All levels are `(price, size)` with strictly
/// positive values.
pub type BookSide = Vec<(Decimal, Decimal)>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: BookSide,
    pub asks: BookSide,
}

impl OrderBook {
    /// Normalize a raw side into canonical form: drop non-positive prices,
    /// take the absolute value of size, then sort. `descending` is `true` for
    /// bids, `false` for asks. Mirrors the normalization every venue adapter
    /// performs on list-of-lists or list-of-object book payloads.
    pub fn normalize_side(mut raw: Vec<(Decimal, Decimal)>, descending: bool) -> BookSide {
        raw.retain(|(price, _)| *price > Decimal::ZERO);
        for (_, size) in raw.iter_mut() {
            *size = size.abs();
        }
        if descending {
            raw.sort_by(|a, b| b.0.cmp(&a.0));
        } else {
            raw.sort_by(|a, b| a.0.cmp(&b.0));
        }
        raw
    }

    pub fn bid1(&self) -> Option<(Decimal, Decimal)> {
        self.bids.first().copied()
    }

    pub fn ask1(&self) -> Option<(Decimal, Decimal)> {
        self.asks.first().copied()
    }

    /// `bids` strictly non-increasing, `asks` strictly non-decreasing — the
    /// canonical-form invariant tested in spec.md §8.
    pub fn is_canonical(&self) -> bool {
        let bids_ok = self.bids.windows(2).all(|w| w[0].0 >= w[1].0);
        let asks_ok = self.asks.windows(2).all(|w| w[0].0 <= w[1].0);
        let positive = self
            .bids
            .iter()
            .chain(self.asks.iter())
            .all(|(p, s)| *p > Decimal::ZERO && *s >= Decimal::ZERO);
        bids_ok && asks_ok && positive
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum InstrumentStatus {
    Trading,
    PreLaunch,
    Suspended,
    Delivering,
    Delisted,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, Default)]
pub enum ContractType {
    #[default]
    Perpetual,
    Futures,
}

/// Tradeable contract metadata used for lot/tick rounding in preflight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    pub base_coin: Coin,
    pub quote_coin: Coin,
    pub status: InstrumentStatus,
    pub settle_coin: Coin,
    pub contract_type: ContractType,
    pub qty_step: Decimal,
    pub min_order_qty: Decimal,
    pub tick_size: Decimal,
    pub quanto_multiplier: Option<Decimal>,
    pub min_notional: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normalize_side_drops_non_positive_and_sorts_descending() {
        let raw = vec![(dec!(10), dec!(-2)), (dec!(0), dec!(1)), (dec!(9), dec!(3))];
        let side = OrderBook::normalize_side(raw, true);
        assert_eq!(side, vec![(dec!(10), dec!(2)), (dec!(9), dec!(3))]);
    }

    #[test]
    fn normalize_side_sorts_ascending_for_asks() {
        let raw = vec![(dec!(9), dec!(1)), (dec!(8), dec!(1))];
        let side = OrderBook::normalize_side(raw, false);
        assert_eq!(side, vec![(dec!(8), dec!(1)), (dec!(9), dec!(1))]);
    }

    #[test]
    fn is_canonical_detects_out_of_order_book() {
        let book = OrderBook {
            bids: vec![(dec!(9), dec!(1)), (dec!(10), dec!(1))],
            asks: vec![],
        };
        assert!(!book.is_canonical());
    }
}
