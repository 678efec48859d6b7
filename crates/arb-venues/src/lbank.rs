//! LBank futures adapter (spec.md §4.2, §6.1; SPEC_FULL.md "LBank instrument
//! catalog cache + marketOrder fallback").
//!
//! LBank's public order book endpoint (`/pub/depth`) is behind a Cloudflare
//! challenge often enough that the transport comes back with a WAF-shaped
//! failure (`Ok(None)`) instead of data. When that happens this adapter
//! falls back to the `marketOrder` depth endpoint, which serves the same
//! book under a path Cloudflare doesn't intercept. Only if that also fails
//! does it fall back further to a synthetic single-level book built from the
//! ticker's top-of-book and the instrument's minimum order size — coarse,
//! but enough for the liquidity check to make a conservative pass/fail call
//! instead of treating the venue as unusable for the whole cycle. The
//! instrument catalog itself (lot/tick/min-qty filters) is fetched once and
//! cached, since LBank returns the full contract list from a single
//! endpoint.

use crate::{adapter::VenueAdapter, parsing, symbols};
use arb_core::{
    market::{ContractType, InstrumentStatus, OrderBook},
    sanity::clamp_ticker,
    Coin, FundingInfo, Instrument, Symbol, Ticker, VenueError, VenueId,
};
use arb_transport::{HttpTransport, TransportConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::debug;

pub const BASE_URL: &str = "https://lbkperp.lbank.com";
const CATALOG_TTL: Duration = Duration::from_secs(300);
/// Synthetic fallback book depth, expressed as a multiple of `min_order_qty`
/// on each side when `/pub/depth` is unreachable.
const FALLBACK_DEPTH_MULTIPLE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

struct Catalog {
    fetched_at: Option<Instant>,
    instruments: HashMap<Symbol, Instrument>,
}

pub struct LbankAdapter {
    transport: HttpTransport,
    catalog: Mutex<Catalog>,
}

impl LbankAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Lbank, BASE_URL, TransportConfig::default())?;
        Ok(Self {
            transport,
            catalog: Mutex::new(Catalog {
                fetched_at: None,
                instruments: HashMap::new(),
            }),
        })
    }

    fn ok(data: &Value) -> bool {
        data.get("error_code").and_then(Value::as_i64) == Some(0)
    }

    async fn refresh_catalog(&self) -> Result<(), VenueError> {
        let data: Option<Value> = self.transport.get_json("/cfd/openApi/v1/pub/instrument", &[]).await?;
        let Some(data) = data else { return Ok(()) };
        if !Self::ok(&data) {
            return Ok(());
        }
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            return Ok(());
        };

        let mut instruments = HashMap::new();
        for entry in list {
            let Some(symbol_str) = entry.get("symbol").and_then(Value::as_str) else {
                continue;
            };
            let symbol = Symbol::new(symbol_str);
            let base_coin = Coin::new(symbols::strip_separators(symbol_str).trim_end_matches("USDT"));
            let qty_step = parsing::decimal_field(entry, "qtyStep").unwrap_or(Decimal::ONE);
            let min_order_qty = parsing::decimal_field(entry, "minQty").unwrap_or(qty_step);
            let tick_size = parsing::decimal_field(entry, "priceTick").unwrap_or(Decimal::ONE);
            instruments.insert(
                symbol.clone(),
                Instrument {
                    symbol,
                    base_coin,
                    quote_coin: Coin::new("USDT"),
                    status: InstrumentStatus::Trading,
                    settle_coin: Coin::new("USDT"),
                    contract_type: ContractType::Perpetual,
                    qty_step,
                    min_order_qty,
                    tick_size,
                    quanto_multiplier: None,
                    min_notional: None,
                },
            );
        }

        let mut catalog = self.catalog.lock();
        let count = instruments.len();
        catalog.instruments = instruments;
        catalog.fetched_at = Some(Instant::now());
        debug!(venue = "lbank", count, "refreshed instrument catalog");
        Ok(())
    }

    async fn catalog_entry(&self, symbol: &Symbol) -> Result<Option<Instrument>, VenueError> {
        let stale = {
            let catalog = self.catalog.lock();
            catalog.fetched_at.map_or(true, |at| at.elapsed() >= CATALOG_TTL)
        };
        if stale {
            self.refresh_catalog().await?;
        }
        Ok(self.catalog.lock().instruments.get(symbol).cloned())
    }

    /// Orderbook via the `marketOrder` depth endpoint, used when `/pub/depth`
    /// is Cloudflare-blocked (spec.md §8 scenario 4). Response shape is
    /// `data.{bids,asks} = [{price, volume}, ...]`.
    async fn market_order_book(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let depth_param = depth.clamp(1, 200).to_string();
        let data: Option<Value> = self
            .transport
            .get_json("/cfd/openApi/v1/pub/marketOrder", &[("symbol", symbol.as_str()), ("depth", depth_param.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(result) = data.get("data") else { return Ok(None) };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(result.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(result.get("asks").unwrap_or(&Value::Null)), false);
        if bids.is_empty() || asks.is_empty() {
            return Ok(None);
        }
        debug!(venue = "lbank", %symbol, "pub/depth unavailable, used marketOrder fallback");
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn synthetic_book(&self, coin: &Coin) -> Result<Option<OrderBook>, VenueError> {
        let Some(ticker) = self.get_futures_ticker(coin).await? else {
            return Ok(None);
        };
        let symbol = self.normalize_symbol(coin);
        let size = self
            .catalog_entry(&symbol)
            .await?
            .map(|inst| inst.min_order_qty * FALLBACK_DEPTH_MULTIPLE)
            .unwrap_or(Decimal::ONE);
        debug!(venue = "lbank", %symbol, "depth endpoint unavailable, using synthetic single-level book");
        Ok(Some(OrderBook {
            bids: vec![(ticker.bid, size)],
            asks: vec![(ticker.ask, size)],
        }))
    }
}

#[async_trait]
impl VenueAdapter for LbankAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Lbank
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        symbols::normalize_coin_usdt(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/cfd/openApi/v1/pub/ticker", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(entry) = data.get("data").and_then(Value::as_array).and_then(|l| l.first()) else {
            return Ok(None);
        };
        let Some(price) = parsing::decimal_field(entry, "last") else {
            return Ok(None);
        };
        let bid = parsing::decimal_field(entry, "buy").unwrap_or(price);
        let ask = parsing::decimal_field(entry, "sell").unwrap_or(price);
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/cfd/openApi/v1/pub/fundingRate", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if !Self::ok(&data) {
            return Ok(None);
        }
        let Some(entry) = data.get("data") else { return Ok(None) };
        let Some(rate) = parsing::decimal_field(entry, "fundingRate") else {
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
        let size = depth.clamp(1, 100).to_string();
        let data: Option<Value> = self
            .transport
            .get_json("/cfd/openApi/v1/pub/depth", &[("symbol", symbol.as_str()), ("size", &size)])
            .await?;
        let depth_book = match data {
            Some(data) if Self::ok(&data) => data.get("data").map(|result| {
                let bids = OrderBook::normalize_side(parsing::parse_book_side(result.get("bids").unwrap_or(&Value::Null)), true);
                let asks = OrderBook::normalize_side(parsing::parse_book_side(result.get("asks").unwrap_or(&Value::Null)), false);
                OrderBook { bids, asks }
            }),
            _ => None,
        };
        if let Some(book) = depth_book {
            if !book.bids.is_empty() || !book.asks.is_empty() {
                return Ok(Some(book));
            }
        }

        if let Some(book) = self.market_order_book(coin, depth).await? {
            return Ok(Some(book));
        }

        self.synthetic_book(coin).await
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        if self.catalog.lock().fetched_at.map_or(true, |at| at.elapsed() >= CATALOG_TTL) {
            self.refresh_catalog().await?;
        }
        Ok(self.catalog.lock().instruments.values().map(|i| i.base_coin.clone()).collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        let symbol = self.normalize_symbol(coin);
        self.catalog_entry(&symbol).await
    }
}
