//! Bitget v2 mix (USDT-margined futures) adapter (spec.md §4.2, §6.1).
//! Success is the string code `"00000"`; every other code means "no usable
//! data this cycle", same treatment as a transport-level miss.

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

pub const BASE_URL: &str = "https://api.bitget.com";
const PRODUCT_TYPE: &str = "USDT-FUTURES";

pub struct BitgetAdapter {
    transport: HttpTransport,
}

impl BitgetAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Bitget, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }

    fn ok(data: &Value) -> bool {
        data.get("code").and_then(Value::as_str) == Some("00000")
    }

    fn first_entry(data: &Value) -> Option<&Value> {
        data.get("data")?.as_array()?.first()
    }
}

#[async_trait]
impl VenueAdapter for BitgetAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Bitget
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_coin_usdt(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json(
                "/api/v2/mix/market/ticker",
                &[("symbol", symbol.as_str()), ("productType", PRODUCT_TYPE)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(entry) = Self::first_entry(&data) else {
            return Ok(None);
        };
        let Some(price) = parsing::decimal_field(entry, "lastPr") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(entry, "bidPr").unwrap_or(price);
        let ask = parsing::decimal_field(entry, "askPr").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json(
                "/api/v2/mix/market/ticker",
                &[("symbol", symbol.as_str()), ("productType", PRODUCT_TYPE)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
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
        let limit = depth.clamp(1, 100).to_string();
        let data: Option<Value> = self
            .transport
            .get_json(
                "/api/v2/mix/market/merge-depth",
                &[("symbol", symbol.as_str()), ("productType", PRODUCT_TYPE), ("limit", &limit)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(result) = data.get("data") else { return Ok(None) };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(result.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(result.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Value> = self
            .transport
            .get_json("/api/v2/mix/market/contracts", &[("productType", PRODUCT_TYPE)])
            .await?;
        let Some(data) = data else { return Ok(HashSet::new()) };
        if !Self::ok(&data) {
            return Ok(HashSet::new());
        }
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            return Ok(HashSet::new());
        };
        Ok(list
            .iter()
            .filter_map(|entry| entry.get("baseCoin").and_then(Value::as_str))
            .map(Coin::new)
            .collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json(
                "/api/v2/mix/market/contracts",
                &[("symbol", symbol.as_str()), ("productType", PRODUCT_TYPE)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(entry) = Self::first_entry(&data) else {
            return Ok(None);
        };

        let volume_place = entry.get("volumePlace").and_then(Value::as_str).and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);
        let price_place = entry.get("pricePlace").and_then(Value::as_str).and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);
        let qty_step = Decimal::new(1, volume_place);
        let tick_size = Decimal::new(1, price_place);
        let min_order_qty = parsing::decimal_field(entry, "minTradeNum").unwrap_or(qty_step);
        let quanto_multiplier = parsing::decimal_field(entry, "sizeMultiplier");

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
