use crate::{symbol::Symbol, venue::VenueId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum TimeInForce {
    GoodTillCancel,
    ImmediateOrCancel,
    FillOrKill,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Terminal states that resolve a per-order waiter (spec.md §4.3.2).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Internal order representation, mutated exclusively by private-stream
/// updates or REST polling (spec.md §3 Lifecycle).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: Decimal,
    pub price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub req_id: String,
    pub status: OrderStatus,
    pub cum_exec_qty: Decimal,
    pub avg_price: Option<Decimal>,
}

impl Order {
    /// Strict full-fill check used by the Execution Engine (spec.md §4.7.3):
    /// `cumExecQty + eps >= qty`.
    pub fn is_fully_filled(&self, eps: Decimal) -> bool {
        self.cum_exec_qty + eps >= self.qty
    }
}

/// `(symbol, positionIdx, side)`. `positionIdx` distinguishes one-way (0)
/// from hedge mode (1 = Buy, 2 = Sell).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct PositionKey {
    pub symbol: Symbol,
    pub position_idx: u8,
    pub side: PositionSide,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum PositionSide {
    Buy,
    Sell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn is_fully_filled_requires_cum_qty_within_epsilon_of_qty() {
        let mut order = Order {
            venue: VenueId::Bybit,
            symbol: Symbol::new("BTCUSDT"),
            side: Side::Buy,
            order_type: OrderType::Market,
            qty: dec!(1.0),
            price: None,
            time_in_force: TimeInForce::ImmediateOrCancel,
            req_id: "r1".into(),
            status: OrderStatus::PartiallyFilled,
            cum_exec_qty: dec!(0.999999),
            avg_price: None,
        };
        assert!(order.is_fully_filled(dec!(0.000001)));
        order.cum_exec_qty = dec!(0.5);
        assert!(!order.is_fully_filled(dec!(0.000001)));
    }

    #[test]
    fn order_status_terminal_states() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }
}
