use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Default)]
struct Fields {
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    last_trade: Option<Decimal>,
    last_ticker: Option<Decimal>,
}

#[derive(Copy, Clone, Debug)]
struct Timestamps {
    bidask: Instant,
    trade: Instant,
    ticker: Instant,
}

impl Default for Timestamps {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            bidask: now,
            trade: now,
            ticker: now,
        }
    }
}

/// In-memory state for a single symbol's public stream: best bid/ask, last
/// trade price, last ticker price, each with its own monotonic freshness
/// timestamp (spec.md §4.3.1). Guarded by a single lock — critical sections
/// are small insert/lookup only, per spec.md §5.
#[derive(Default)]
pub struct MarketState {
    fields: RwLock<Fields>,
    timestamps: RwLock<Timestamps>,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct MarketSnapshot {
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub last_trade: Option<Decimal>,
    pub last_ticker: Option<Decimal>,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_bid_ask(&self, bid: Decimal, ask: Decimal) {
        let mut fields = self.fields.write();
        fields.best_bid = Some(bid);
        fields.best_ask = Some(ask);
        self.timestamps.write().bidask = Instant::now();
    }

    pub fn update_trade(&self, price: Decimal) {
        self.fields.write().last_trade = Some(price);
        self.timestamps.write().trade = Instant::now();
    }

    pub fn update_ticker(&self, price: Decimal) {
        self.fields.write().last_ticker = Some(price);
        self.timestamps.write().ticker = Instant::now();
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        let fields = *self.fields.read();
        MarketSnapshot {
            best_bid: fields.best_bid,
            best_ask: fields.best_ask,
            last_trade: fields.last_trade,
            last_ticker: fields.last_ticker,
        }
    }

    /// Fresh bid/ask AND at least one of trade/ticker fresh, within
    /// `max_age`. Mirrors `BybitPublicWS.is_ready` from the original
    /// implementation.
    pub fn is_ready(&self, max_age: Duration) -> bool {
        let fields = *self.fields.read();
        if fields.best_bid.is_none() || fields.best_ask.is_none() {
            return false;
        }
        let ts = *self.timestamps.read();
        let now = Instant::now();
        if now.duration_since(ts.bidask) > max_age {
            return false;
        }
        if fields.last_trade.is_none() && fields.last_ticker.is_none() {
            return false;
        }
        let trade_fresh = fields.last_trade.is_some() && now.duration_since(ts.trade) <= max_age;
        let ticker_fresh = fields.last_ticker.is_some() && now.duration_since(ts.ticker) <= max_age;
        trade_fresh || ticker_fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn not_ready_without_bid_ask() {
        let state = MarketState::new();
        assert!(!state.is_ready(Duration::from_secs(5)));
    }

    #[test]
    fn not_ready_without_trade_or_ticker() {
        let state = MarketState::new();
        state.update_bid_ask(dec!(100), dec!(101));
        assert!(!state.is_ready(Duration::from_secs(5)));
    }

    #[test]
    fn ready_when_bid_ask_and_one_price_source_are_fresh() {
        let state = MarketState::new();
        state.update_bid_ask(dec!(100), dec!(101));
        state.update_trade(dec!(100.5));
        assert!(state.is_ready(Duration::from_secs(5)));
    }

    #[test]
    fn stale_bid_ask_fails_readiness() {
        let state = MarketState::new();
        state.update_bid_ask(dec!(100), dec!(101));
        state.update_trade(dec!(100.5));
        assert!(!state.is_ready(Duration::from_millis(0)));
    }
}
