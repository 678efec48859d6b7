//! Shared data model and error taxonomy for the perpetual-futures arbitrage
//! scanner/executor. Every other crate in the workspace depends on this one
//! for its vocabulary: [`VenueId`], [`Coin`], [`Symbol`], [`Ticker`],
//! [`OrderBook`], [`Instrument`], [`NewsItem`], [`LiquidityReport`],
//! [`Opportunity`], [`Order`] and [`PositionKey`].

pub mod error;
pub mod liquidity;
pub mod market;
pub mod news;
pub mod opportunity;
pub mod order;
pub mod sanity;
pub mod sink;
pub mod symbol;
pub mod time;
pub mod venue;

pub use error::VenueError;
pub use liquidity::{check_liquidity, vwap_for_notional, LiquidityMode, LiquidityReport};
pub use market::{FundingInfo, Instrument, InstrumentStatus, OrderBook, Ticker};
pub use news::NewsItem;
pub use opportunity::{Opportunity, Verdict};
pub use order::{Order, OrderStatus, OrderType, PositionKey, Side, TimeInForce};
pub use sink::Sink;
pub use symbol::{Coin, Symbol};
pub use venue::VenueId;
