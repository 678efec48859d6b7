//! OKX public-data adapter (spec.md §4.2, §6.1). Success is the string code
//! `"0"`; OKX wraps every result list (including empty-on-unknown-instId) in
//! a `data: [...]` envelope regardless of endpoint.

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

pub const BASE_URL: &str = "https://www.okx.com";

pub struct OkxAdapter {
    transport: HttpTransport,
}

impl OkxAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Okx, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }

    fn first_entry(data: &Value) -> Option<&Value> {
        if data.get("code").and_then(Value::as_str) != Some("0") {
            return None;
        }
        data.get("data")?.as_array()?.first()
    }
}

#[async_trait]
impl VenueAdapter for OkxAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Okx
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_okx(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/api/v5/market/ticker", &[("instId", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        let Some(entry) = Self::first_entry(&data) else {
            return Ok(None);
        };
        let Some(price) = parsing::decimal_field(entry, "last") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(entry, "bidPx").unwrap_or(price);
        let ask = parsing::decimal_field(entry, "askPx").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/api/v5/public/funding-rate", &[("instId", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        let Some(entry) = Self::first_entry(&data) else {
            return Ok(None);
        };
        let Some(rate) = parsing::decimal_field(entry, "fundingRate") else {
            return Ok(None);
        };
        let next_funding_time_ms = entry
            .get("nextFundingTime")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok());
        Ok(Some(FundingInfo {
            rate,
            next_funding_time_ms,
        }))
    }

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let sz = depth.clamp(1, 400).to_string();
        let data: Option<Value> = self
            .transport
            .get_json("/api/v5/market/books", &[("instId", symbol.as_str()), ("sz", &sz)])
            .await?;
        let Some(data) = data else { return Ok(None) };
        let Some(entry) = Self::first_entry(&data) else {
            return Ok(None);
        };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(entry.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(entry.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Value> = self
            .transport
            .get_json("/api/v5/public/instruments", &[("instType", "SWAP")])
            .await?;
        let Some(data) = data else { return Ok(HashSet::new()) };
        if data.get("code").and_then(Value::as_str) != Some("0") {
            return Ok(HashSet::new());
        }
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            return Ok(HashSet::new());
        };
        Ok(list
            .iter()
            .filter(|entry| entry.get("settleCcy").and_then(Value::as_str) == Some("USDT"))
            .filter_map(|entry| entry.get("ctValCcy").and_then(Value::as_str))
            .map(Coin::new)
            .collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/api/v5/public/instruments", &[("instType", "SWAP"), ("instId", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        let Some(entry) = Self::first_entry(&data) else {
            return Ok(None);
        };

        let qty_step = parsing::decimal_field(entry, "lotSz").unwrap_or(Decimal::ONE);
        let tick_size = parsing::decimal_field(entry, "tickSz").unwrap_or(Decimal::ONE);
        let min_order_qty = parsing::decimal_field(entry, "minSz").unwrap_or(qty_step);
        let quanto_multiplier = parsing::decimal_field(entry, "ctVal");

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
            quanto_multiplier,
            min_notional: None,
        }))
    }
}
