//! Opportunity Evaluator (spec.md §4.5): turns a `(coin, longVenue,
//! shortVenue)` candidate with already-fetched tickers/funding into a scored
//! [`arb_core::Opportunity`], gating on liquidity and news/risk.

pub mod config;
pub mod evaluator;
pub mod spread;
pub mod verdict;

pub use config::EvaluatorConfig;
pub use evaluator::{evaluate, LegInput};
pub use spread::{funding_spread_pct, price_spread_pct, FundingMode};
