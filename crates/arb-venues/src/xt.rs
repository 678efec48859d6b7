//! XT futures adapter (spec.md §4.2, §6.1). Success is `returnCode == 0`;
//! anything else carries a human `msgInfo` that is logged at debug and
//! otherwise discarded — XT does not distinguish "symbol not found" from
//! other request errors in its response shape.

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
use tracing::debug;

pub const BASE_URL: &str = "https://fapi.xt.com";

pub struct XtAdapter {
    transport: HttpTransport,
}

impl XtAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Xt, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }

    fn ok(data: &Value) -> bool {
        data.get("returnCode").and_then(Value::as_i64) == Some(0)
    }
}

#[async_trait]
impl VenueAdapter for XtAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Xt
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_lowercase_underscore(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/future/market/v1/public/q/ticker", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            debug!(venue = "xt", %symbol, msg = ?data.get("msgInfo"), "non-zero returnCode");
            return Ok(None);
        }
        let Some(result) = data.get("result") else { return Ok(None) };
        let Some(price) = parsing::decimal_field(result, "c") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(result, "b").unwrap_or(price);
        let ask = parsing::decimal_field(result, "a").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/future/market/v1/public/q/funding-rate", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(result) = data.get("result") else { return Ok(None) };
        let Some(rate) = parsing::decimal_field(result, "fundingRate") else {
            return Ok(None);
        };
        let next_funding_time_ms = result.get("nextCollectionTime").and_then(Value::as_i64);
        Ok(Some(FundingInfo {
            rate,
            next_funding_time_ms,
        }))
    }

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let level = depth.clamp(1, 50).to_string();
        let data: Option<Value> = self
            .transport
            .get_json(
                "/future/market/v1/public/q/depth",
                &[("symbol", symbol.as_str()), ("level", &level)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(result) = data.get("result") else { return Ok(None) };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(result.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(result.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Value> = self
            .transport
            .get_json("/future/market/v1/public/contract/list", &[])
            .await?;
        let Some(data) = data else { return Ok(HashSet::new()) };
        if !Self::ok(&data) {
            return Ok(HashSet::new());
        }
        let Some(list) = data.get("result").and_then(Value::as_array) else {
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
            .get_json("/future/market/v1/public/contract/list", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(entry) = data
            .get("result")
            .and_then(Value::as_array)
            .and_then(|list| list.iter().find(|e| e.get("symbol").and_then(Value::as_str) == Some(symbol.as_str())))
        else {
            return Ok(None);
        };

        let qty_precision = entry.get("quantityPrecision").and_then(Value::as_u64).unwrap_or(0) as u32;
        let price_precision = entry.get("pricePrecision").and_then(Value::as_u64).unwrap_or(0) as u32;
        let qty_step = Decimal::new(1, qty_precision);
        let tick_size = Decimal::new(1, price_precision);
        let min_order_qty = parsing::decimal_field(entry, "minQty").unwrap_or(qty_step);
        let quanto_multiplier = parsing::decimal_field(entry, "contractSize");

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
