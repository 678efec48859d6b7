//! Binance USDT-M futures adapter (spec.md §4.2, §6.1). Error responses are
//! a `{"code": <negative>, "msg": "..."}` body (usually alongside a non-2xx
//! status, which the transport already turns into `None`); the `code` field
//! is otherwise absent from success bodies, so its presence alone is enough
//! to treat a response as not-found.

use crate::{adapter::VenueAdapter, parsing, symbols};
use arb_core::{
    market::{ContractType, InstrumentStatus, OrderBook},
    sanity::clamp_ticker,
    Coin, FundingInfo, Instrument, Symbol, Ticker, VenueError, VenueId,
};
use arb_transport::{HttpTransport, TransportConfig};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;

pub const BASE_URL: &str = "https://fapi.binance.com";

pub struct BinanceAdapter {
    transport: HttpTransport,
}

impl BinanceAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Binance, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }

    fn is_error(data: &Value) -> bool {
        data.get("code").is_some() && data.get("msg").is_some()
    }
}

#[async_trait]
impl VenueAdapter for BinanceAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Binance
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_coin_usdt(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let book: Option<Value> = self
            .transport
            .get_json("/fapi/v1/ticker/bookTicker", &[("symbol", symbol.as_str())])
            .await?;
        let Some(book) = book else { return Ok(None) };
        if Self::is_error(&book) {
            return Ok(None);
        }
        let bid = parsing::decimal_field(&book, "bidPrice");
        let ask = parsing::decimal_field(&book, "askPrice");

        let last: Option<Value> = self
            .transport
            .get_json("/fapi/v1/ticker/price", &[("symbol", symbol.as_str())])
            .await?;
        let Some(last) = last else { return Ok(None) };
        if Self::is_error(&last) {
            return Ok(None);
        }
        let Some(price) = parsing::decimal_field(&last, "price") else {
            return Ok(None);
        };
        Ok(Some(clamp_ticker(price, bid.unwrap_or(price), ask.unwrap_or(price))))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/fapi/v1/premiumIndex", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if Self::is_error(&data) {
            return Ok(None);
        }
        let Some(rate) = parsing::decimal_field(&data, "lastFundingRate") else {
            return Ok(None);
        };
        let next_funding_time_ms = data.get("nextFundingTime").and_then(Value::as_i64);
        Ok(Some(FundingInfo {
            rate,
            next_funding_time_ms,
        }))
    }

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let limit = snap_binance_limit(depth).to_string();
        let data: Option<Value> = self
            .transport
            .get_json("/fapi/v1/depth", &[("symbol", symbol.as_str()), ("limit", &limit)])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if Self::is_error(&data) {
            return Ok(None);
        }
        let bids = OrderBook::normalize_side(parsing::parse_book_side(data.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(data.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Value> = self.transport.get_json("/fapi/v1/exchangeInfo", &[]).await?;
        let Some(data) = data else { return Ok(HashSet::new()) };
        let Some(list) = data.get("symbols").and_then(Value::as_array) else {
            return Ok(HashSet::new());
        };
        Ok(list
            .iter()
            .filter(|entry| entry.get("contractType").and_then(Value::as_str) == Some("PERPETUAL"))
            .filter_map(|entry| entry.get("baseAsset").and_then(Value::as_str))
            .map(Coin::new)
            .collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self.transport.get_json("/fapi/v1/exchangeInfo", &[]).await?;
        let Some(data) = data else { return Ok(None) };
        let Some(entry) = data
            .get("symbols")
            .and_then(Value::as_array)
            .and_then(|list| list.iter().find(|e| e.get("symbol").and_then(Value::as_str) == Some(symbol.as_str())))
        else {
            return Ok(None);
        };
        let Some(filters) = entry.get("filters").and_then(Value::as_array) else {
            return Ok(None);
        };
        let lot = filters.iter().find(|f| f.get("filterType").and_then(Value::as_str) == Some("LOT_SIZE"));
        let price_filter = filters.iter().find(|f| f.get("filterType").and_then(Value::as_str) == Some("PRICE_FILTER"));
        let min_notional_filter = filters
            .iter()
            .find(|f| f.get("filterType").and_then(Value::as_str) == Some("MIN_NOTIONAL"));

        let qty_step = lot.and_then(|f| parsing::decimal_field(f, "stepSize")).unwrap_or(Decimal::ONE);
        let min_order_qty = lot.and_then(|f| parsing::decimal_field(f, "minQty")).unwrap_or(Decimal::ZERO);
        let tick_size = price_filter.and_then(|f| parsing::decimal_field(f, "tickSize")).unwrap_or(Decimal::ONE);
        let min_notional = min_notional_filter.and_then(|f| parsing::decimal_field(f, "notional"));

        Ok(Some(Instrument {
            symbol,
            base_coin: coin.clone(),
            quote_coin: Coin::new("USDT"),
            status: InstrumentStatus::Trading,
            settle_coin: Coin::new("USDT"),
            contract_type: ContractType::Perpetual,
            qty_step,
            min_order_qty,
            tick_size,
            quanto_multiplier: None,
            min_notional,
        }))
    }
}

/// Binance only accepts a fixed set of `limit` values for depth requests.
fn snap_binance_limit(depth: usize) -> usize {
    const ALLOWED: [usize; 6] = [5, 10, 20, 50, 100, 500];
    ALLOWED.iter().copied().find(|l| *l >= depth).unwrap_or(500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_binance_limit_rounds_up_to_nearest_allowed_value() {
        assert_eq!(snap_binance_limit(1), 5);
        assert_eq!(snap_binance_limit(20), 20);
        assert_eq!(snap_binance_limit(60), 100);
        assert_eq!(snap_binance_limit(1000), 500);
    }

    #[test]
    fn is_error_detects_code_and_msg_pair() {
        assert!(BinanceAdapter::is_error(&serde_json::json!({"code": -1121, "msg": "Invalid symbol."})));
        assert!(!BinanceAdapter::is_error(&serde_json::json!({"symbol": "BTCUSDT", "price": "100"})));
    }
}
