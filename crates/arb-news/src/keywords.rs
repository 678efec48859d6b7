//! Keyword sets and the coin-mention regex used by [`crate::matching`]
//! (spec.md §4.4.2). Delisting keywords are deliberately "hard" terms only —
//! "suspend"/"halt" alone are not treated as delisting signals, since those
//! also cover routine maintenance windows.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Hard delisting terms, English and Russian (venues with Russian-language
/// announcement mirrors surface these too).
pub static DELISTING_KEYWORDS: &[&str] = &[
    "delist",
    "delisting",
    "delisted",
    "remove trading pair",
    "removal of trading pair",
    "cease trading",
    "terminat", // terminate / termination
    "делистинг",
    "прекращение торгов",
    "вывод из листинга",
];

/// Security-incident terms. Checked only when delisting terms are absent
/// (spec.md §4.5.1 "cheaper path").
pub static SECURITY_KEYWORDS: &[&str] = &[
    "hack",
    "hacked",
    "exploit",
    "exploited",
    "breach",
    "breached",
    "phishing",
    "scam",
    "funds stolen",
    "stolen funds",
    "взлом",
    "эксплойт",
    "утечка средств",
    "фишинг",
];

/// `true` if any keyword in `set` occurs (case-insensitively) in `text`.
pub fn contains_any(text: &str, set: &[&str]) -> bool {
    let lower = text.to_lowercase();
    set.iter().any(|kw| lower.contains(&kw.to_lowercase()))
}

/// Build the coin-mention regex `(?<![A-Z0-9])COIN(?:USDT)?(?![A-Z0-9])`,
/// case-insensitive. `regex` crate has no lookaround, so the boundary
/// condition is emulated with a non-capturing alternation anchored on
/// non-alphanumeric or string edges, then verified in [`mentions_coin`].
pub fn coin_mention_regex(coin: &str) -> Regex {
    let escaped = regex::escape(coin);
    let pattern = format!(r"(?:^|[^A-Za-z0-9]){escaped}(?:USDT)?(?:$|[^A-Za-z0-9])");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("coin mention pattern is always valid regex")
}

/// `true` if `coin` is mentioned in `text` as a standalone token (spec.md
/// §4.4.2). Builds the regex fresh per call; callers evaluating many
/// articles for the same coin should cache the compiled regex themselves.
pub fn mentions_coin(text: &str, coin: &str) -> bool {
    coin_mention_regex(coin).is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_coin_matches_bare_and_usdt_suffixed_forms() {
        assert!(mentions_coin("BTC is being delisted", "BTC"));
        assert!(mentions_coin("Removal of BTCUSDT trading pair", "BTC"));
        assert!(mentions_coin("trading pair btc/usdt", "BTC"));
    }

    #[test]
    fn mentions_coin_rejects_substring_of_longer_ticker() {
        assert!(!mentions_coin("ABTC is unaffected", "BTC"));
        assert!(!mentions_coin("BTCX token notice", "BTC"));
    }

    #[test]
    fn contains_any_is_case_insensitive() {
        assert!(contains_any("This token will be DELISTED next week", DELISTING_KEYWORDS));
        assert!(!contains_any("Routine maintenance window", DELISTING_KEYWORDS));
    }

    #[test]
    fn security_keywords_detect_hack_and_phishing() {
        assert!(contains_any("Wallet hacked, funds stolen", SECURITY_KEYWORDS));
        assert!(contains_any("Beware of phishing attempts", SECURITY_KEYWORDS));
    }
}
