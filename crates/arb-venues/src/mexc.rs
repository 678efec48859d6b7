//! MEXC contract API adapter (spec.md §4.2, §6.1; SPEC_FULL.md "MEXC dual-
//! client failover + bulk cache").
//!
//! MEXC is the one venue whose symbol normalization isn't a pure function of
//! `(venue, coin)`: some contracts use a base coin spelling that differs from
//! the exchange-wide convention (e.g. rebrands), so an `alias` table is
//! consulted first and [`symbols::normalize_mexc`] is the fallback. MEXC's
//! contract host has also proven flaky enough in production to warrant a
//! secondary domain, and its per-symbol ticker/funding endpoints are cheap to
//! replace with a periodically refreshed bulk snapshot instead of one request
//! per coin per scan cycle.

use crate::{adapter::VenueAdapter, parsing, symbols};
use arb_core::{
    market::{ContractType, InstrumentStatus, OrderBook},
    sanity::clamp_ticker,
    Coin, FundingInfo, Instrument, Symbol, Ticker, VenueError, VenueId,
};
use arb_transport::{HttpTransport, TransportConfig};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::debug;

pub const BASE_URL: &str = "https://contract.mexc.com";
pub const SECONDARY_URL: &str = "https://futures.mexc.com";

/// Not-found / invalid-symbol codes MEXC returns on its contract endpoints.
const NOT_FOUND_CODES: [i64; 2] = [510, 1001];

const TICKER_CACHE_TTL: Duration = Duration::from_secs(2);
const FUNDING_CACHE_TTL: Duration = Duration::from_secs(5);

struct BulkCache<T> {
    fetched_at: Option<Instant>,
    ttl: Duration,
    entries: HashMap<Symbol, T>,
}

impl<T> BulkCache<T> {
    fn new(ttl: Duration) -> Self {
        Self {
            fetched_at: None,
            ttl,
            entries: HashMap::new(),
        }
    }

    fn is_stale(&self) -> bool {
        match self.fetched_at {
            Some(at) => at.elapsed() >= self.ttl,
            None => true,
        }
    }
}

pub struct MexcAdapter {
    transport: HttpTransport,
    /// `None` until the first catalog load attempt; `Some(_)` afterward (even
    /// if the load found nothing), mirroring the original's
    /// `Optional[Dict[str, str]]` "loaded once" semantics.
    alias: RwLock<Option<HashMap<Coin, Symbol>>>,
    ticker_cache: Mutex<BulkCache<(Decimal, Decimal, Decimal)>>,
    funding_cache: Mutex<BulkCache<FundingInfo>>,
}

impl MexcAdapter {
    pub fn new() -> Result<Self, VenueError> {
        let transport = HttpTransport::new(VenueId::Mexc, BASE_URL, TransportConfig::default())?
            .with_secondary(SECONDARY_URL)?;
        Ok(Self {
            transport,
            alias: RwLock::new(None),
            ticker_cache: Mutex::new(BulkCache::new(TICKER_CACHE_TTL)),
            funding_cache: Mutex::new(BulkCache::new(FUNDING_CACHE_TTL)),
        })
    }

    /// Register a manual symbol override for `coin`, taking precedence over
    /// [`symbols::normalize_mexc`] in all future calls.
    pub fn set_alias(&self, coin: Coin, symbol: Symbol) {
        self.alias.write().get_or_insert_with(HashMap::new).insert(coin, symbol);
    }

    /// Derive a `(coin, symbol)` alias entry from one `/contract/detail` row,
    /// the way `_mexc_coin_from_contract` does in the original: only active
    /// USDT-settled perpetuals, coin taken from `displayName` when present
    /// (stripping the `_USDT` suffix) and otherwise from the symbol itself.
    fn derive_alias_entry(entry: &Value) -> Option<(Coin, Symbol)> {
        let symbol = entry.get("symbol").and_then(Value::as_str)?;
        if !symbol.to_uppercase().ends_with("_USDT") {
            return None;
        }
        if let Some(settle) = entry.get("settleCoin").and_then(Value::as_str) {
            if !settle.eq_ignore_ascii_case("USDT") {
                return None;
            }
        }
        if let Some(state) = entry.get("state") {
            let state_str = state.as_str().map(str::to_string).or_else(|| state.as_i64().map(|n| n.to_string()));
            if matches!(state_str.as_deref(), Some("3") | Some("4") | Some("5")) {
                return None;
            }
        }

        let display = entry
            .get("displayName")
            .or_else(|| entry.get("display_name"))
            .or_else(|| entry.get("displayNameEn"))
            .or_else(|| entry.get("display_name_en"))
            .and_then(Value::as_str);

        let coin = display
            .and_then(|d| {
                let upper = d.to_uppercase();
                upper
                    .find("_USDT")
                    .map(|idx| upper[..idx].chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>())
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| symbol.to_uppercase().trim_end_matches("_USDT").to_string());

        Some((Coin::new(coin), Symbol::new(symbol)))
    }

    /// Build the alias map from a `/contract/detail` listing and store it,
    /// replacing whatever was loaded before.
    fn populate_aliases(&self, list: &[Value]) {
        let mut aliases = HashMap::new();
        for entry in list {
            if let Some((coin, symbol)) = Self::derive_alias_entry(entry) {
                aliases.insert(coin, symbol);
            }
        }
        debug!(venue = "mexc", count = aliases.len(), "loaded mexc contract aliases");
        *self.alias.write() = Some(aliases);
    }

    /// Load the alias table from `/contract/detail` once; a prior load
    /// (even an empty one) is not repeated unless `force_reload` is set.
    async fn ensure_aliases_loaded(&self, force_reload: bool) -> Result<(), VenueError> {
        if !force_reload && self.alias.read().is_some() {
            return Ok(());
        }
        let data: Option<Value> = self.transport.get_json("/api/v1/contract/detail", &[]).await?;
        let Some(data) = data else {
            *self.alias.write() = Some(HashMap::new());
            return Ok(());
        };
        if Self::is_not_found(&data) {
            *self.alias.write() = Some(HashMap::new());
            return Ok(());
        }
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            *self.alias.write() = Some(HashMap::new());
            return Ok(());
        };
        self.populate_aliases(list);
        Ok(())
    }

    fn is_not_found(data: &Value) -> bool {
        if data.get("success").and_then(Value::as_bool) == Some(false) {
            return true;
        }
        match data.get("code").and_then(Value::as_i64) {
            Some(code) => NOT_FOUND_CODES.contains(&code) && code != 0,
            None => false,
        }
    }

    async fn refresh_ticker_cache(&self) -> Result<(), VenueError> {
        let data: Option<Value> = self.transport.get_json("/api/v1/contract/ticker", &[]).await?;
        let Some(data) = data else { return Ok(()) };
        if Self::is_not_found(&data) {
            return Ok(());
        }
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            return Ok(());
        };

        let mut entries = HashMap::new();
        for entry in list {
            let Some(symbol) = entry.get("symbol").and_then(Value::as_str) else {
                continue;
            };
            let Some(price) = parsing::decimal_field(entry, "lastPrice") else {
                continue;
            };
            let bid = parsing::decimal_field(entry, "bid1").unwrap_or(price);
            let ask = parsing::decimal_field(entry, "ask1").unwrap_or(price);
            entries.insert(Symbol::new(symbol), (price, bid, ask));
        }

        let mut cache = self.ticker_cache.lock();
        cache.entries = entries;
        cache.fetched_at = Some(Instant::now());
        debug!(venue = "mexc", count = cache.entries.len(), "refreshed bulk ticker cache");
        Ok(())
    }

    async fn refresh_funding_cache(&self) -> Result<(), VenueError> {
        let data: Option<Value> = self.transport.get_json("/api/v1/contract/funding_rate", &[]).await?;
        let Some(data) = data else { return Ok(()) };
        if Self::is_not_found(&data) {
            return Ok(());
        }
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            return Ok(());
        };

        let mut entries = HashMap::new();
        for entry in list {
            let Some(symbol) = entry.get("symbol").and_then(Value::as_str) else {
                continue;
            };
            let Some(rate) = parsing::decimal_field(entry, "fundingRate") else {
                continue;
            };
            let next_funding_time_ms = entry.get("nextSettleTime").and_then(Value::as_i64);
            entries.insert(
                Symbol::new(symbol),
                FundingInfo {
                    rate,
                    next_funding_time_ms,
                },
            );
        }

        let mut cache = self.funding_cache.lock();
        cache.entries = entries;
        cache.fetched_at = Some(Instant::now());
        Ok(())
    }
}

#[async_trait]
impl VenueAdapter for MexcAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Mexc
    }

    fn normalize_symbol(&self, coin: &Coin) -> Symbol {
        if let Some(symbol) = self.alias.read().as_ref().and_then(|map| map.get(coin).cloned()) {
            return symbol;
        }
        symbols::normalize_mexc(coin)
    }

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError> {
        self.ensure_aliases_loaded(false).await?;
        let symbol = self.normalize_symbol(coin);
        if self.ticker_cache.lock().is_stale() {
            self.refresh_ticker_cache().await?;
        }
        let cache = self.ticker_cache.lock();
        let Some((price, bid, ask)) = cache.entries.get(&symbol).copied() else {
            return Ok(None);
        };
        Ok(Some(clamp_ticker(price, bid, ask)))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError> {
        self.ensure_aliases_loaded(false).await?;
        let symbol = self.normalize_symbol(coin);
        if self.funding_cache.lock().is_stale() {
            self.refresh_funding_cache().await?;
        }
        Ok(self.funding_cache.lock().entries.get(&symbol).copied())
    }

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError> {
        self.ensure_aliases_loaded(false).await?;
        let symbol = self.normalize_symbol(coin);
        let limit = depth.clamp(1, 100).to_string();
        let data: Option<Value> = self
            .transport
            .get_json(&format!("/api/v1/contract/depth/{}", symbol.as_str()), &[("limit", limit.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if Self::is_not_found(&data) {
            return Ok(None);
        }
        let Some(book) = data.get("data") else { return Ok(None) };
        let bids = OrderBook::normalize_side(parsing::parse_book_side(book.get("bids").unwrap_or(&Value::Null)), true);
        let asks = OrderBook::normalize_side(parsing::parse_book_side(book.get("asks").unwrap_or(&Value::Null)), false);
        Ok(Some(OrderBook { bids, asks }))
    }

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError> {
        let data: Option<Value> = self.transport.get_json("/api/v1/contract/detail", &[]).await?;
        let Some(data) = data else { return Ok(HashSet::new()) };
        let Some(list) = data.get("data").and_then(Value::as_array) else {
            return Ok(HashSet::new());
        };
        if self.alias.read().is_none() {
            self.populate_aliases(list);
        }
        Ok(list
            .iter()
            .filter_map(|entry| entry.get("baseCoin").and_then(Value::as_str))
            .map(Coin::new)
            .collect())
    }

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError> {
        self.ensure_aliases_loaded(false).await?;
        let symbol = self.normalize_symbol(coin);
        let data: Option<Value> = self
            .transport
            .get_json("/api/v1/contract/detail", &[("symbol", symbol.as_str())])
            .await?;
        let Some(data) = data else { return Ok(None) };
        if Self::is_not_found(&data) {
            return Ok(None);
        }
        let Some(entry) = data.get("data") else { return Ok(None) };

        let qty_step = parsing::decimal_field(entry, "volUnit").unwrap_or(Decimal::ONE);
        let min_order_qty = parsing::decimal_field(entry, "minVol").unwrap_or(Decimal::ONE);
        let tick_size = parsing::decimal_field(entry, "priceUnit").unwrap_or(Decimal::ONE);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_takes_precedence_over_plain_normalization() {
        let adapter = MexcAdapter::new().unwrap();
        let coin = Coin::new("RENAMED");
        assert_eq!(adapter.normalize_symbol(&coin).as_str(), "RENAMED_USDT");
        adapter.set_alias(coin.clone(), Symbol::new("OLDNAME_USDT"));
        assert_eq!(adapter.normalize_symbol(&coin).as_str(), "OLDNAME_USDT");
    }

    #[test]
    fn populate_aliases_maps_display_name_to_contract_symbol() {
        // spec.md §8 scenario 3: FUN -> SPORTFUN_USDT, derived from a catalog
        // row whose own baseCoin-derived symbol would otherwise collide.
        let adapter = MexcAdapter::new().unwrap();
        let catalog = serde_json::json!([
            {
                "symbol": "SPORTFUN_USDT",
                "settleCoin": "USDT",
                "state": "0",
                "displayName": "FUN_USDT",
            }
        ]);
        adapter.populate_aliases(catalog.as_array().unwrap());
        let coin = Coin::new("FUN");
        assert_eq!(adapter.normalize_symbol(&coin).as_str(), "SPORTFUN_USDT");
    }

    #[test]
    fn populate_aliases_skips_delisted_contracts() {
        let adapter = MexcAdapter::new().unwrap();
        let catalog = serde_json::json!([
            {"symbol": "DEAD_USDT", "settleCoin": "USDT", "state": "4", "displayName": "OTHER_USDT"}
        ]);
        adapter.populate_aliases(catalog.as_array().unwrap());
        // delisted (state=4) row must not alias OTHER -> DEAD_USDT.
        let coin = Coin::new("OTHER");
        assert_eq!(adapter.normalize_symbol(&coin).as_str(), "OTHER_USDT");
    }

    #[test]
    fn is_not_found_detects_success_false_and_known_codes() {
        assert!(MexcAdapter::is_not_found(&serde_json::json!({"success": false, "code": 510})));
        assert!(MexcAdapter::is_not_found(&serde_json::json!({"success": true, "code": 1001})));
        assert!(!MexcAdapter::is_not_found(&serde_json::json!({"success": true, "code": 0})));
    }
}
