//! Bybit V5 unified API adapter (spec.md §4.2, §6.1). `retCode == 0` is
//! success; everything else is treated as "data unavailable this cycle"
//! (`ProtocolError`), logged at warn, never propagated as a hard error.

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
use std::time::Duration;
use tracing::debug;

pub const BASE_URL: &str = "https://api.bybit.com";

pub struct BybitAdapter {
    transport: HttpTransport,
}

impl BybitAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Bybit, BASE_URL, TransportConfig::default())?;
        Ok(Self { transport })
    }

    fn entry<'a>(data: &'a Value, symbol: &str) -> Option<&'a Value> {
        data.get("result")?
            .get("list")?
            .as_array()?
            .iter()
            .find(|e| e.get("symbol").and_then(Value::as_str) == Some(symbol))
    }
}

#[async_trait]
impl VenueAdapter for BybitAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Bybit
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_coin_usdt(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/v5/market/tickers", &[("category", "linear"), ("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };

        if data.get("retCode").and_then(Value::as_i64) != Some(0) {
            debug!(venue = "bybit", %symbol, "non-zero retCode, treating as not found");
            return Ok(None);
        }
        let Some(entry) = Self::entry(&data, symbol.as_str()) else {
            return Ok(None);
        };

        let Some(price) = parsing::decimal_field(entry, "lastPrice") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(entry, "bid1Price").unwrap_or(price);
        let ask = parsing::decimal_field(entry, "ask1Price").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/v5/market/tickers", &[("category", "linear"), ("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if data.get("retCode").and_then(Value::as_i64) != Some(0) {
            return Ok(None);
        }
        let Some(entry) = Self::entry(&data, symbol.as_str()) else {
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
        let limit = depth.clamp(1, 200).to_string();
        let data: Option<Value> = self
            .transport
            .get_json(
                "/v5/market/orderbook",
                &[("category", "linear"), ("symbol", symbol.as_str()), ("limit", &limit)],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if data.get("retCode").and_then(Value::as_i64) != Some(0) {
            return Ok(None);
        }
        let Some(result) = data.get("result") else {
            return Ok(None);
        };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(result.get("b").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(result.get("a").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Value> = self
            .transport
            .get_json("/v5/market/instruments-info", &[("category", "linear")])
            .await?;
        let Some(data) = data else { return Ok(HashSet::new()) };
        if data.get("retCode").and_then(Value::as_i64) != Some(0) {
            return Ok(HashSet::new());
        }
        let Some(list) = data.get("result").and_then(|r| r.get("list")).and_then(Value::as_array) else {
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
                "/v5/market/instruments-info",
                &[("category", "linear"), ("symbol", symbol.as_str())],
            )
            .await?;
        let Some(data) = data else { return Ok(None) };
        if data.get("retCode").and_then(Value::as_i64) != Some(0) {
            return Ok(None);
        }
        let Some(entry) = Self::entry(&data, symbol.as_str()) else {
            return Ok(None);
        };
        let lot = entry.get("lotSizeFilter");
        let price_filter = entry.get("priceFilter");
        let qty_step = lot.and_then(|l| parsing::decimal_field(l, "qtyStep")).unwrap_or(Decimal::ONE);
        let min_order_qty = lot.and_then(|l| parsing::decimal_field(l, "minOrderQty")).unwrap_or(Decimal::ZERO);
        let tick_size = price_filter.and_then(|p| parsing::decimal_field(p, "tickSize")).unwrap_or(Decimal::ONE);

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

/// Default per-call read timeout for Bybit (spec.md §5 Timeouts).
pub fn default_read_timeout() -> Duration {
    Duration::from_secs(8)
}
