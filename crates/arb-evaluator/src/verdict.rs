//! Pure verdict assembly from liquidity reports and news lookups (spec.md
//! §4.5 step 5: `verdict = liquidity_ok AND no_delisting AND no_security`).
//! Kept separate from the async fan-out in [`crate::evaluator`] so the
//! decision logic itself is unit-testable without a network or adapters.

use arb_core::{LiquidityReport, Verdict};
use arb_news::cache::NewsLookup;

/// Priority order when more than one gating condition fails: delisting is
/// reported ahead of a security incident, which is reported ahead of a
/// liquidity shortfall — a coin being delisted is the more actionable signal.
pub fn assemble(
    long_liquidity: Option<&LiquidityReport>,
    short_liquidity: Option<&LiquidityReport>,
    long_news: &NewsLookup,
    short_news: &NewsLookup,
) -> (Verdict, Vec<String>) {
    let mut reasons = Vec::new();

    let has_delisting = !long_news.delisting.is_empty() || !short_news.delisting.is_empty();
    let has_security = !long_news.security.is_empty() || !short_news.security.is_empty();

    let liquidity_ok = match (long_liquidity, short_liquidity) {
        (Some(long), Some(short)) => long.ok && short.ok,
        _ => false,
    };
    if let Some(long) = long_liquidity {
        if !long.ok {
            reasons.extend(long.reasons.iter().map(|r| format!("long leg: {r}")));
        }
    } else {
        reasons.push("long leg: no orderbook".into());
    }
    if let Some(short) = short_liquidity {
        if !short.ok {
            reasons.extend(short.reasons.iter().map(|r| format!("short leg: {r}")));
        }
    } else {
        reasons.push("short leg: no orderbook".into());
    }

    if has_delisting {
        reasons.push("delisting".into());
        return (Verdict::Delisting, reasons);
    }
    if has_security {
        reasons.push("security risk".into());
        return (Verdict::SecurityRisk, reasons);
    }
    if !liquidity_ok {
        return (Verdict::LiquidityInsufficient, reasons);
    }
    (Verdict::Favorable, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::NewsItem;
    use arb_core::news::NewsSource;
    use arb_core::VenueId;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ok_report() -> LiquidityReport {
        LiquidityReport {
            ok: true,
            notional_usdt: dec!(50),
            ..Default::default()
        }
    }

    fn delisting_item() -> NewsItem {
        NewsItem {
            title: "delisting notice".into(),
            body: String::new(),
            url: None,
            source: NewsSource::Venue(VenueId::Gate),
            published_at: Utc::now(),
            published_at_inferred: false,
            tags: vec![],
        }
    }

    #[test]
    fn favorable_when_liquidity_ok_and_no_news() {
        let (verdict, _) = assemble(Some(&ok_report()), Some(&ok_report()), &NewsLookup::default(), &NewsLookup::default());
        assert_eq!(verdict, Verdict::Favorable);
    }

    #[test]
    fn delisting_takes_priority_over_liquidity_insufficient() {
        let bad_report = LiquidityReport::default();
        let news = NewsLookup {
            delisting: vec![delisting_item()],
            security: vec![],
        };
        let (verdict, reasons) = assemble(Some(&bad_report), None, &news, &NewsLookup::default());
        assert_eq!(verdict, Verdict::Delisting);
        assert!(reasons.iter().any(|r| r == "delisting"));
    }

    #[test]
    fn liquidity_insufficient_when_either_leg_missing() {
        let (verdict, _) = assemble(Some(&ok_report()), None, &NewsLookup::default(), &NewsLookup::default());
        assert_eq!(verdict, Verdict::LiquidityInsufficient);
    }

    #[test]
    fn security_risk_reported_when_no_delisting_present() {
        let news = NewsLookup {
            delisting: vec![],
            security: vec![delisting_item()],
        };
        let (verdict, _) = assemble(Some(&ok_report()), Some(&ok_report()), &NewsLookup::default(), &news);
        assert_eq!(verdict, Verdict::SecurityRisk);
    }
}
