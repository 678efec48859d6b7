//! HTML scraping strategy for venues with no announcements API (MEXC, Gate,
//! XT, Binance, Bitget, OKX, BingX) (spec.md §4.4.1).

use crate::dates;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const ALLOW_PATTERNS: &[&str] = &["article", "announcement", "support", "help", "square", "post"];
const DENY_PATTERNS: &[&str] = &["/categories/", "/sections/", "/tag/", "/search", "/login", "/register"];
const SNIPPET_MAX_CHARS: usize = 2048;

/// One candidate scraped off a listing page, before coin/keyword matching.
#[derive(Clone, Debug)]
pub struct RawCandidate {
    pub title: String,
    pub body_snippet: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// `true` if `href` matches at least one allow pattern and none of the deny
/// patterns (spec.md §4.4.1).
pub fn href_is_candidate(href: &str) -> bool {
    let lower = href.to_lowercase();
    if DENY_PATTERNS.iter().any(|d| lower.contains(d)) {
        return false;
    }
    ALLOW_PATTERNS.iter().any(|a| lower.contains(a))
}

/// Parse a listing page and return every candidate anchor, resolved to an
/// absolute URL against `base_url`.
pub fn extract_candidates(base_url: &Url, body: &str) -> Vec<RawCandidate> {
    let document = Html::parse_document(body);
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else { continue };
        if !href_is_candidate(href) {
            continue;
        }
        let Ok(absolute) = base_url.join(href) else { continue };

        let title = anchor.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        let body_snippet = nearby_paragraph(anchor).unwrap_or_default();
        let published_at = nearby_time(anchor);

        candidates.push(RawCandidate {
            title,
            body_snippet,
            url: absolute.to_string(),
            published_at,
        });
    }
    candidates
}

fn nearby_paragraph(anchor: ElementRef) -> Option<String> {
    let p_selector = Selector::parse("p").ok()?;
    let parent = anchor.parent_element()?;
    let text: String = parent
        .select(&p_selector)
        .next()
        .map(|p| p.text().collect())
        .unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(truncate(trimmed, SNIPPET_MAX_CHARS))
    }
}

fn nearby_time(anchor: ElementRef) -> Option<DateTime<Utc>> {
    let time_selector = Selector::parse("time[datetime]").ok()?;
    let parent = anchor.parent_element()?;
    parent
        .select(&time_selector)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Extract a full article's body and date for the conditional-prefetch path
/// (spec.md §4.4.2): body from `<main>`/`<article>`/a content-like `<div>`,
/// falling back to the full page text; date via [`dates::extract_date`].
pub fn extract_article(body: &str) -> (String, Option<DateTime<Utc>>) {
    let document = Html::parse_document(body);
    let date = dates::extract_date(&document);

    for selector_str in ["main", "article", "div[class*=content]", "div[class*=article]", "div[class*=body]", "div[class*=post]"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(el) = document.select(&selector).next() {
                let text = el.text().collect::<String>();
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return (truncate(trimmed, SNIPPET_MAX_CHARS), date);
                }
            }
        }
    }

    let full_text = document.root_element().text().collect::<String>();
    (truncate(full_text.trim(), SNIPPET_MAX_CHARS), date)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_is_candidate_respects_allow_and_deny_lists() {
        assert!(href_is_candidate("/support/announcement/123"));
        assert!(!href_is_candidate("/categories/announcement/123"));
        assert!(!href_is_candidate("/search?q=btc"));
        assert!(!href_is_candidate("/pricing"));
    }

    #[test]
    fn extract_candidates_resolves_relative_hrefs_and_skips_non_matching() {
        let base = Url::parse("https://exchange.example").unwrap();
        let body = r#"
            <html><body>
                <a href="/support/announcement/1">BTC delisting notice</a><p>Trading of BTCUSDT will stop.</p>
                <a href="/login">Login</a>
            </body></html>
        "#;
        let candidates = extract_candidates(&base, body);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://exchange.example/support/announcement/1");
        assert!(candidates[0].body_snippet.contains("BTCUSDT"));
    }

    #[test]
    fn extract_article_prefers_article_tag_over_full_page() {
        let body = r#"<html><body><nav>menu</nav><article>The real content about BTC.</article></body></html>"#;
        let (text, _) = extract_article(body);
        assert_eq!(text, "The real content about BTC.");
    }
}
