//! Date extraction cascade for scraped articles (spec.md §4.4.1, §4.4.2):
//! `<time datetime>` first, then common meta tags, then JSON-LD.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

const META_DATE_PROPERTIES: &[&str] = &["article:published_time", "og:published_time", "datePublished"];

/// Try `<time datetime="...">` first, then `<meta>` date properties, then a
/// `datePublished` key inside any `<script type="application/ld+json">`
/// block. Returns `None` if nothing parses, letting the caller fall back to
/// `now` with `published_at_inferred = true`.
pub fn extract_date(document: &Html) -> Option<DateTime<Utc>> {
    extract_time_tag(document)
        .or_else(|| extract_meta_tag(document))
        .or_else(|| extract_json_ld(document))
}

fn parse_flexible(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn extract_time_tag(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse("time[datetime]").ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr("datetime").and_then(parse_flexible))
}

fn extract_meta_tag(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse("meta").ok()?;
    document.select(&selector).find_map(|el| {
        let value = el.value();
        let property = value.attr("property").or_else(|| value.attr("name"))?;
        if !META_DATE_PROPERTIES.contains(&property) {
            return None;
        }
        value.attr("content").and_then(parse_flexible)
    })
}

fn extract_json_ld(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document.select(&selector).find_map(|el| {
        let raw = el.text().collect::<String>();
        let json: serde_json::Value = serde_json::from_str(&raw).ok()?;
        let type_ok = json
            .get("@type")
            .and_then(serde_json::Value::as_str)
            .map(|t| matches!(t, "Article" | "NewsArticle" | "BlogPosting" | "Posting"))
            .unwrap_or(false);
        if !type_ok {
            return None;
        }
        json.get("datePublished")
            .and_then(serde_json::Value::as_str)
            .and_then(parse_flexible)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_time_tag() {
        let html = Html::parse_document(r#"<html><body><time datetime="2024-05-01T10:00:00Z">May 1</time></body></html>"#);
        let date = extract_date(&html).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn extracts_from_meta_tag_when_no_time_tag() {
        let html = Html::parse_document(
            r#"<html><head><meta property="article:published_time" content="2024-06-01T00:00:00Z"></head></html>"#,
        );
        assert!(extract_date(&html).is_some());
    }

    #[test]
    fn extracts_from_json_ld_news_article() {
        let html = Html::parse_document(
            r#"<html><head><script type="application/ld+json">{"@type":"NewsArticle","datePublished":"2024-07-01T00:00:00Z"}</script></head></html>"#,
        );
        assert!(extract_date(&html).is_some());
    }

    #[test]
    fn returns_none_when_no_date_present() {
        let html = Html::parse_document("<html><body><p>no dates here</p></body></html>");
        assert!(extract_date(&html).is_none());
    }
}
