//! Deterministic (venue, coin) -> [`Symbol`] normalization (spec.md §3, §8).
//! Every function here is pure; the one exception carved out by the spec is
//! MEXC, whose [`crate::mexc::MexcAdapter`] consults a runtime alias table
//! before falling back to [`normalize_mexc`].

use arb_core::{Coin, Symbol, VenueId};

pub fn normalize(venue: VenueId, coin: &Coin) -> Symbol {
    match venue {
        VenueId::Bybit | VenueId::Binance | VenueId::Bitget => normalize_coin_usdt(coin),
        VenueId::Gate | VenueId::Mexc => normalize_mexc(coin),
        VenueId::Xt => normalize_lowercase_underscore(coin),
        VenueId::Bingx => normalize_hyphen(coin),
        VenueId::Okx => normalize_okx(coin),
        VenueId::Lbank => normalize_coin_usdt(coin),
    }
}

/// `COINUSDT` — Bybit, Binance, Bitget, LBank.
pub fn normalize_coin_usdt(coin: &Coin) -> Symbol {
    Symbol::new(format!("{coin}USDT"))
}

/// `COIN_USDT` — Gate, plain-MEXC fallback (before alias lookup).
pub fn normalize_mexc(coin: &Coin) -> Symbol {
    Symbol::new(format!("{coin}_USDT"))
}

/// `coin_usdt` lowercase — XT.
pub fn normalize_lowercase_underscore(coin: &Coin) -> Symbol {
    Symbol::new(format!("{}_usdt", coin.as_str().to_ascii_lowercase()))
}

/// `COIN-USDT` — BingX.
pub fn normalize_hyphen(coin: &Coin) -> Symbol {
    Symbol::new(format!("{coin}-USDT"))
}

/// `COIN-USDT-SWAP` — OKX.
pub fn normalize_okx(coin: &Coin) -> Symbol {
    Symbol::new(format!("{coin}-USDT-SWAP"))
}

/// Canonical form used to compare a raw venue symbol against a `Coin`
/// independent of separator style, e.g. when matching LBank's catalog
/// (`COINUSDT` canonical strip of `-`/`_`).
pub fn strip_separators(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_pure_function_of_venue_and_coin() {
        let btc = Coin::new("btc");
        assert_eq!(normalize(VenueId::Bybit, &btc).as_str(), "BTCUSDT");
        assert_eq!(normalize(VenueId::Gate, &btc).as_str(), "BTC_USDT");
        assert_eq!(normalize(VenueId::Mexc, &btc).as_str(), "BTC_USDT");
        assert_eq!(normalize(VenueId::Xt, &btc).as_str(), "btc_usdt");
        assert_eq!(normalize(VenueId::Binance, &btc).as_str(), "BTCUSDT");
        assert_eq!(normalize(VenueId::Bitget, &btc).as_str(), "BTCUSDT");
        assert_eq!(normalize(VenueId::Okx, &btc).as_str(), "BTC-USDT-SWAP");
        assert_eq!(normalize(VenueId::Bingx, &btc).as_str(), "BTC-USDT");
        assert_eq!(normalize(VenueId::Lbank, &btc).as_str(), "BTCUSDT");
    }

    #[test]
    fn strip_separators_produces_canonical_comparable_form() {
        assert_eq!(strip_separators("BTC-USDT"), "BTCUSDT");
        assert_eq!(strip_separators("btc_usdt"), "BTCUSDT");
        assert_eq!(strip_separators("BTCUSDT"), "BTCUSDT");
    }
}
