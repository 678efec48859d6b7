//! Operator input parsing (spec.md §6.3): the opening line `COIN Long
//! (VENUE), Short (VENUE) [AMOUNT]` and the follow-up open-or-monitor
//! confirmation `Да[, X%]` / `Нет`. Interactive prompt *loops* are out of
//! scope; only these two parsers are.

use crate::error::InputError;
use arb_core::{Coin, VenueId};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// A parsed opening request, ready for venue-registry validation.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenRequest {
    pub coin: Coin,
    pub long_venue: VenueId,
    pub short_venue: VenueId,
    pub coin_amount: Option<Decimal>,
}

static OPEN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([A-Za-z0-9]+)\s+Long\s*\(\s*([A-Za-z.]+)\s*\)\s*,\s*Short\s*\(\s*([A-Za-z.]+)\s*\)\s*(?:\s+([0-9]+(?:\.[0-9]+)?))?\s*$")
        .expect("static regex is valid")
});

/// Parse `"BTC Long (Bybit), Short (Gate) 0.5"` into an [`OpenRequest`].
/// Venues are validated by name against [`VenueId::parse`] here; the caller
/// is responsible for checking the parsed venues are actually registered
/// adapters (spec.md §6.3 "validated against the adapter registry").
pub fn parse_open_request(line: &str) -> Result<OpenRequest, InputError> {
    let captures = OPEN_LINE.captures(line.trim()).ok_or(InputError::Malformed)?;

    let coin = Coin::new(&captures[1].to_ascii_uppercase());
    let long_venue = VenueId::parse(&captures[2]).ok_or_else(|| InputError::UnknownVenue(captures[2].to_string()))?;
    let short_venue = VenueId::parse(&captures[3]).ok_or_else(|| InputError::UnknownVenue(captures[3].to_string()))?;

    if long_venue == short_venue {
        return Err(InputError::SameVenue);
    }

    let coin_amount = captures.get(4).map(|m| Decimal::from_str(m.as_str())).transpose().map_err(|_| InputError::Malformed)?;

    Ok(OpenRequest {
        coin,
        long_venue,
        short_venue,
        coin_amount,
    })
}

/// Operator's answer to "open now or just monitor?" (spec.md §6.3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Confirmation {
    /// `Да[, X%]` — open the position; `close_threshold_pct` is the
    /// optional monitor-until-close trigger (spec.md §4.7.4).
    Yes { close_threshold_pct: Option<Decimal> },
    /// `Нет` — decline.
    No,
}

static CONFIRM_YES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*Да\s*(?:,\s*([0-9]+(?:\.[0-9]+)?)\s*%?\s*)?$").expect("static regex is valid"));
static CONFIRM_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*Нет\s*$").expect("static regex is valid"));

pub fn parse_confirmation(line: &str) -> Result<Confirmation, InputError> {
    let trimmed = line.trim();
    if CONFIRM_NO.is_match(trimmed) {
        return Ok(Confirmation::No);
    }
    if let Some(captures) = CONFIRM_YES.captures(trimmed) {
        let close_threshold_pct = captures.get(1).map(|m| Decimal::from_str(m.as_str())).transpose().map_err(|_| InputError::BadConfirmation)?;
        return Ok(Confirmation::Yes { close_threshold_pct });
    }
    Err(InputError::BadConfirmation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_full_line_with_amount() {
        let req = parse_open_request("BTC Long (Bybit), Short (Gate) 0.5").unwrap();
        assert_eq!(req.coin, Coin::new("BTC"));
        assert_eq!(req.long_venue, VenueId::Bybit);
        assert_eq!(req.short_venue, VenueId::Gate);
        assert_eq!(req.coin_amount, Some(dec!(0.5)));
    }

    #[test]
    fn parses_line_without_amount() {
        let req = parse_open_request("eth long (okx), short (mexc)").unwrap();
        assert_eq!(req.coin, Coin::new("ETH"));
        assert_eq!(req.coin_amount, None);
    }

    #[test]
    fn rejects_same_venue() {
        assert_eq!(parse_open_request("BTC Long (Bybit), Short (Bybit)"), Err(InputError::SameVenue));
    }

    #[test]
    fn rejects_unknown_venue() {
        assert_eq!(parse_open_request("BTC Long (Deribit), Short (Gate)"), Err(InputError::UnknownVenue("Deribit".into())));
    }

    #[test]
    fn rejects_malformed_line() {
        assert_eq!(parse_open_request("just some text"), Err(InputError::Malformed));
    }

    #[test]
    fn parses_yes_with_threshold() {
        let confirmation = parse_confirmation("Да, 0.3%").unwrap();
        assert_eq!(confirmation, Confirmation::Yes { close_threshold_pct: Some(dec!(0.3)) });
    }

    #[test]
    fn parses_bare_yes() {
        assert_eq!(parse_confirmation("да").unwrap(), Confirmation::Yes { close_threshold_pct: None });
    }

    #[test]
    fn parses_no() {
        assert_eq!(parse_confirmation("Нет").unwrap(), Confirmation::No);
    }

    #[test]
    fn rejects_garbage_confirmation() {
        assert_eq!(parse_confirmation("maybe"), Err(InputError::BadConfirmation));
    }
}
