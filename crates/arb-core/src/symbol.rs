use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Canonical uppercase base-asset ticker, e.g. `BTC`. No internal structure;
/// equality/hashing is exact string comparison on the canonical form.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct Coin(SmolStr);

impl Coin {
    /// Construct a [`Coin`] from arbitrary-case input, upper-casing it.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(SmolStr::new(raw.as_ref().to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// `true` if the coin's first character is a digit — the scanner universe
    /// excludes these (spec.md §4.6.1, §8 boundary behaviours).
    pub fn starts_with_digit(&self) -> bool {
        self.0.chars().next().is_some_and(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for Coin {
    fn from(value: &str) -> Self {
        Coin::new(value)
    }
}

impl From<String> for Coin {
    fn from(value: String) -> Self {
        Coin::new(value)
    }
}

/// Venue-local instrument identifier, produced by a deterministic
/// (venue, coin) normalization function. See `arb-venues` for the per-venue
/// rules; MEXC additionally consults a runtime alias table that takes
/// precedence over plain normalization.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct Symbol(SmolStr);

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(SmolStr::new(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_normalizes_to_uppercase() {
        assert_eq!(Coin::new("btc").as_str(), "BTC");
        assert_eq!(Coin::new("Btc"), Coin::new("BTC"));
    }

    #[test]
    fn coin_starts_with_digit_detects_leading_numerals() {
        assert!(Coin::new("1000pepe").starts_with_digit());
        assert!(!Coin::new("pepe").starts_with_digit());
    }

    #[test]
    fn symbol_preserves_case() {
        assert_eq!(Symbol::new("btc_usdt").as_str(), "btc_usdt");
    }
}
