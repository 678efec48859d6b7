use crate::{liquidity::LiquidityReport, market::Ticker, symbol::Coin, venue::VenueId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Evaluator output for one `(coin, longVenue, shortVenue)` candidate.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Verdict {
    Favorable,
    LiquidityInsufficient,
    Delisting,
    SecurityRisk,
    Rejected,
}

impl Verdict {
    pub fn is_favorable(&self) -> bool {
        matches!(self, Verdict::Favorable)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VenueLegData {
    pub venue: VenueId,
    pub ticker: Ticker,
    pub funding_rate: Option<Decimal>,
    pub liquidity: Option<LiquidityReport>,
}

/// A fully evaluated Long/Short candidate, the unit the scanner emits to
/// sinks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Opportunity {
    pub coin: Coin,
    pub long_venue: VenueId,
    pub short_venue: VenueId,
    pub price_spread_pct: Decimal,
    pub funding_spread_pct: Option<Decimal>,
    pub minutes_until_funding: Option<i64>,
    pub long_data: VenueLegData,
    pub short_data: VenueLegData,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
}
