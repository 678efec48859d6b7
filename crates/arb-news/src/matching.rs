//! Per-candidate coin/keyword matching and the conditional prefetch
//! decision (spec.md §4.4.2).

use crate::keywords;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub mention: bool,
    pub keyword_hit: bool,
}

/// Evaluate `text` against `coin` and one keyword set (delisting or
/// security — callers run this twice with different sets per spec.md
/// §4.5.1's "security only if no delisting found" ordering).
pub fn evaluate(text: &str, coin: &str, keyword_set: &[&str]) -> MatchResult {
    MatchResult {
        mention: keywords::mentions_coin(text, coin),
        keyword_hit: keywords::contains_any(text, keyword_set),
    }
}

/// `true` when exactly one of {coin mentioned, keyword present} holds —
/// the article is worth a full fetch to resolve the ambiguity, subject to
/// the per-cycle prefetch budget.
pub fn needs_prefetch(result: &MatchResult) -> bool {
    result.mention != result.keyword_hit
}

/// Final keep decision after any prefetch re-evaluation: both signals must
/// hold, or the venue's own tag set already says `SYMBOL_DELISTING`.
pub fn passes(result: &MatchResult, tags: &[String]) -> bool {
    (result.mention && result.keyword_hit) || tags.iter().any(|t| t == "SYMBOL_DELISTING")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::DELISTING_KEYWORDS;

    #[test]
    fn needs_prefetch_when_exactly_one_signal_present() {
        let only_mention = MatchResult { mention: true, keyword_hit: false };
        let only_keyword = MatchResult { mention: false, keyword_hit: true };
        let both = MatchResult { mention: true, keyword_hit: true };
        let neither = MatchResult { mention: false, keyword_hit: false };
        assert!(needs_prefetch(&only_mention));
        assert!(needs_prefetch(&only_keyword));
        assert!(!needs_prefetch(&both));
        assert!(!needs_prefetch(&neither));
    }

    #[test]
    fn passes_requires_both_signals_or_explicit_tag() {
        let both = MatchResult { mention: true, keyword_hit: true };
        let only_mention = MatchResult { mention: true, keyword_hit: false };
        assert!(passes(&both, &[]));
        assert!(!passes(&only_mention, &[]));
        assert!(passes(&only_mention, &["SYMBOL_DELISTING".to_string()]));
    }

    #[test]
    fn evaluate_uses_supplied_keyword_set() {
        let result = evaluate("BTC will be delisted next week", "BTC", DELISTING_KEYWORDS);
        assert!(result.mention);
        assert!(result.keyword_hit);
    }
}
