use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifies one of the centralized derivatives venues the scanner trades
/// across. Deliberately a closed enum, not a string: venue-specific behaviour
/// (symbol normalization, error codes, quirks) is dispatched on this type
/// throughout `arb-venues`.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VenueId {
    Bybit,
    Gate,
    Mexc,
    Xt,
    Binance,
    Bitget,
    Okx,
    Bingx,
    Lbank,
}

impl VenueId {
    pub const ALL: [VenueId; 9] = [
        VenueId::Bybit,
        VenueId::Gate,
        VenueId::Mexc,
        VenueId::Xt,
        VenueId::Binance,
        VenueId::Bitget,
        VenueId::Okx,
        VenueId::Bingx,
        VenueId::Lbank,
    ];

    /// Parse the short lowercase identifier used in operator input and config
    /// (`bybit`, `gate`, ... ). Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "bybit" => VenueId::Bybit,
            "gate" | "gateio" | "gate.io" => VenueId::Gate,
            "mexc" => VenueId::Mexc,
            "xt" => VenueId::Xt,
            "binance" => VenueId::Binance,
            "bitget" => VenueId::Bitget,
            "okx" => VenueId::Okx,
            "bingx" => VenueId::Bingx,
            "lbank" => VenueId::Lbank,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VenueId::Bybit => "bybit",
            VenueId::Gate => "gate",
            VenueId::Mexc => "mexc",
            VenueId::Xt => "xt",
            VenueId::Binance => "binance",
            VenueId::Bitget => "bitget",
            VenueId::Okx => "okx",
            VenueId::Bingx => "bingx",
            VenueId::Lbank => "lbank",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_round_trips_as_str() {
        for venue in VenueId::ALL {
            let parsed = VenueId::parse(&venue.as_str().to_ascii_uppercase());
            assert_eq!(parsed, Some(venue));
        }
    }

    #[test]
    fn parse_rejects_unknown_venue() {
        assert_eq!(VenueId::parse("deribit"), None);
    }
}
