//! BingX swap v2 adapter (spec.md §4.2, §6.1). Success is `code == 0`;
//! `109425` is an explicit symbol-not-found code and `109415` means the
//! contract is trading-paused — both map to `Ok(None)`, same as any other
//! non-zero code, since none of them are actionable for the scanner.

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

pub const BASE_URL: &str = "https://open-api.bingx.com";

const NOT_FOUND_CODE: i64 = 109425;
const PAUSED_CODE: i64 = 109415;

pub struct BingxAdapter {
    transport: HttpTransport,
}

impl BingxAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Bingx, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }

    fn data<'a>(payload: &'a Value) -> Option<&'a Value> {
        match payload.get("code").and_then(Value::as_i64) {
            Some(0) => payload.get("data"),
            Some(NOT_FOUND_CODE) | Some(PAUSED_CODE) => None,
            _ => None,
        }
    }
}

#[async_trait]
impl VenueAdapter for BingxAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Bingx
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_hyphen(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let payload: Option<Value> = self
            .transport
            .get_json("/openApi/swap/v2/quote/ticker", &[("symbol", symbol.as_str())])
            .await?;
        let Some(payload) = payload else { return Ok(None) };
        let Some(entry) = Self::data(&payload) else {
            return Ok(None);
        };
        let Some(price) = parsing::decimal_field(entry, "lastPrice") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(entry, "bidPrice").unwrap_or(price);
        let ask = parsing::decimal_field(entry, "askPrice").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let payload: Option<Value> = self
            .transport
            .get_json("/openApi/swap/v2/quote/premiumIndex", &[("symbol", symbol.as_str())])
            .await?;
        let Some(payload) = payload else { return Ok(None) };
        let Some(entry) = Self::data(&payload) else {
            return Ok(None);
        };
        let Some(rate) = parsing::decimal_field(entry, "lastFundingRate") else {
            return Ok(None);
        };
        let next_funding_time_ms = entry.get("nextFundingTime").and_then(Value::as_i64);
        Ok(Some(FundingInfo {
            rate,
            next_funding_time_ms,
        }))
    }

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let limit = depth.clamp(1, 100).to_string();
        let payload: Option<Value> = self
            .transport
            .get_json("/openApi/swap/v2/quote/depth", &[("symbol", symbol.as_str()), ("limit", &limit)])
            .await?;
        let Some(payload) = payload else { return Ok(None) };
        let Some(entry) = Self::data(&payload) else {
            return Ok(None);
        };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(entry.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(entry.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let payload: Option<Value> = self
            .transport
            .get_json("/openApi/swap/v2/quote/contracts", &[])
            .await?;
        let Some(payload) = payload else { return Ok(HashSet::new()) };
        let Some(list) = Self::data(&payload).and_then(Value::as_array) else {
            return Ok(HashSet::new());
        };
        Ok(list
            .iter()
            .filter_map(|entry| entry.get("asset").and_then(Value::as_str))
            .map(Coin::new)
            .collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let payload: Option<Value> = self
            .transport
            .get_json("/openApi/swap/v2/quote/contracts", &[("symbol", symbol.as_str())])
            .await?;
        let Some(payload) = payload else { return Ok(None) };
        let Some(list) = Self::data(&payload).and_then(Value::as_array) else {
            return Ok(None);
        };
        let Some(entry) = list.iter().find(|e| e.get("symbol").and_then(Value::as_str) == Some(symbol.as_str())) else {
            return Ok(None);
        };

        let qty_precision = entry.get("quantityPrecision").and_then(Value::as_u64).unwrap_or(0) as u32;
        let price_precision = entry.get("pricePrecision").and_then(Value::as_u64).unwrap_or(0) as u32;
        let qty_step = Decimal::new(1, qty_precision);
        let tick_size = Decimal::new(1, price_precision);
        let min_order_qty = parsing::decimal_field(entry, "tradeMinQuantity").unwrap_or(qty_step);

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
            min_notional: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_treats_not_found_and_paused_codes_as_none() {
        assert!(BingxAdapter::data(&serde_json::json!({"code": NOT_FOUND_CODE})).is_none());
        assert!(BingxAdapter::data(&serde_json::json!({"code": PAUSED_CODE})).is_none());
        assert!(BingxAdapter::data(&serde_json::json!({"code": 0, "data": {"lastPrice": "1"}})).is_some());
    }
}
