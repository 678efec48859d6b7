//! Gate.io USDT-margined futures adapter (spec.md §4.2, §6.1). Gate has no
//! single success/error discriminant field on GET responses: a 200 with a
//! well-formed body is success, anything else (including an empty array for
//! an unknown contract) is "not found".

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

pub const BASE_URL: &str = "https://api.gateio.ws";

pub struct GateAdapter {
    transport: HttpTransport,
}

impl GateAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Gate, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }
}

#[async_trait]
impl VenueAdapter for GateAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Gate
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_mexc(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Vec<Value>> = self
            .transport
            .get_json("/api/v4/futures/usdt/tickers", &[("contract", symbol.as_str())])
            .await?;
        let Some(entry) = data.and_then(|list| list.into_iter().next()) else {
            return Ok(None);
        };
        let Some(price) = parsing::decimal_field(&entry, "last") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(&entry, "highest_bid").unwrap_or(price);
        let ask = parsing::decimal_field(&entry, "lowest_ask").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Vec<Value>> = self
            .transport
            .get_json("/api/v4/futures/usdt/tickers", &[("contract", symbol.as_str())])
            .await?;
        let Some(entry) = data.and_then(|list| list.into_iter().next()) else {
            return Ok(None);
        };
        let Some(rate) = parsing::decimal_field(&entry, "funding_rate") else {
            return Ok(None);
        };
        let next_funding_time_ms = entry
            .get("funding_next_apply")
            .and_then(Value::as_i64)
            .map(|secs| secs * 1000);
        Ok(Some(FundingInfo {
            rate,
            next_funding_time_ms,
        }))
    }

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let limit = depth.clamp(1, 50).to_string();
        let data: Option<Value> = self
            .transport
            .get_json(
                "/api/v4/futures/usdt/order_book",
                &[("contract", symbol.as_str()), ("limit", &limit)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(data.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(data.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Vec<Value>> = self
            .transport
            .get_json("/api/v4/futures/usdt/contracts", &[])
            .await?;
        let Some(list) = data else { return Ok(HashSet::new()) };
        Ok(list
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .filter_map(|name| name.split('_').next())
            .map(Coin::new)
            .collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json(&format!("/api/v4/futures/usdt/contracts/{}", symbol.as_str()), &[])
            .await?;
        let Some(entry) = data else { return Ok(None) };
        let qty_step = Decimal::ONE;
        let min_order_qty = parsing::decimal_field(&entry, "order_size_min").unwrap_or(Decimal::ONE);
        let tick_size = parsing::decimal_field(&entry, "order_price_round").unwrap_or(Decimal::ONE);
        let quanto_multiplier = parsing::decimal_field(&entry, "quanto_multiplier");

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
