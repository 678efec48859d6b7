use arb_core::{
    liquidity::{check_liquidity, LiquidityMode},
    Coin, FundingInfo, Instrument, LiquidityReport, OrderBook, Symbol, Ticker, VenueError, VenueId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Common capability set every venue adapter implements (spec.md §4.2).
/// `checkLiquidity` has a default implementation in terms of
/// [`VenueAdapter::get_orderbook`] — individual adapters only need to
/// override it if they have a cheaper path.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    fn venue(&self) -> VenueId;

    fn normalize_symbol(&self, coin: &Coin) -> Symbol;

    async fn get_futures_ticker(&self, coin: &Coin) -> Result<Option<Ticker>, VenueError>;

    async fn get_funding_rate(&self, coin: &Coin) -> Result<Option<Decimal>, VenueError> {
        Ok(self.get_funding_info(coin).await?.map(|info| info.rate))
    }

    async fn get_funding_info(&self, coin: &Coin) -> Result<Option<FundingInfo>, VenueError>;

    async fn get_orderbook(&self, coin: &Coin, depth: usize) -> Result<Option<OrderBook>, VenueError>;

    async fn get_all_futures_coins(&self) -> Result<HashSet<Coin>, VenueError>;

    async fn get_instrument(&self, coin: &Coin) -> Result<Option<Instrument>, VenueError>;

    async fn check_liquidity(
        &self,
        coin: &Coin,
        notional_usdt: Decimal,
        depth: usize,
        max_spread_bps: Decimal,
        max_impact_bps: Decimal,
        mode: LiquidityMode,
    ) -> Result<Option<LiquidityReport>, VenueError> {
        let Some(book) = self.get_orderbook(coin, depth).await? else {
            return Ok(None);
        };
        Ok(Some(check_liquidity(
            &book,
            notional_usdt,
            mode,
            max_spread_bps,
            max_impact_bps,
        )))
    }
}

/// Registry of enabled adapters, keyed by [`VenueId`]. Scanner loops fan out
/// over `venue -> set<Coin>` built from this registry (spec.md §4.6.1); the
/// registry itself does not know about scanners or evaluators (spec.md §9
/// "Cyclic handles").
#[derive(Default)]
pub struct VenueRegistry {
    adapters: Vec<(VenueId, std::sync::Arc<dyn VenueAdapter>)>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: std::sync::Arc<dyn VenueAdapter>) {
        self.adapters.push((adapter.venue(), adapter));
    }

    pub fn get(&self, venue: VenueId) -> Option<&std::sync::Arc<dyn VenueAdapter>> {
        self.adapters.iter().find(|(id, _)| *id == venue).map(|(_, a)| a)
    }

    pub fn venues(&self) -> impl Iterator<Item = VenueId> + '_ {
        self.adapters.iter().map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &std::sync::Arc<dyn VenueAdapter>> {
        self.adapters.iter().map(|(_, a)| a)
    }
}
