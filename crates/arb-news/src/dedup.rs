//! URL normalization and dedup for announcement/article candidates
//! (spec.md §4.4.1).

use arb_core::NewsItem;
use std::collections::HashSet;
use url::Url;

/// Strip query and fragment, preserve path. Falls back to the raw string if
/// it doesn't parse as an absolute URL (relative hrefs are resolved to
/// absolute before reaching this function).
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// Dedup `items` by normalized URL (or title prefix when no URL is
/// present), then stable-sort newest-first with `published_at_inferred`
/// items pushed after real-dated ones at the same rank (spec.md §4.4.1).
pub fn dedup_and_sort(mut items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items.retain(|item| {
        let key = match &item.url {
            Some(url) => normalize_url(url),
            None => item.dedup_key(),
        };
        seen.insert(key)
    });

    items.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then(a.published_at_inferred.cmp(&b.published_at_inferred))
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::news::NewsSource;
    use arb_core::VenueId;
    use chrono::{TimeZone, Utc};

    fn item(url: &str, minutes_ago: i64, inferred: bool) -> NewsItem {
        NewsItem {
            title: "title".into(),
            body: "body".into(),
            url: Some(url.into()),
            source: NewsSource::Venue(VenueId::Bybit),
            published_at: Utc.timestamp_opt(1_700_000_000 - minutes_ago * 60, 0).unwrap(),
            published_at_inferred: inferred,
            tags: vec![],
        }
    }

    #[test]
    fn normalize_url_strips_query_and_fragment() {
        assert_eq!(
            normalize_url("https://x.com/a/b?ref=1#frag"),
            "https://x.com/a/b"
        );
    }

    #[test]
    fn dedup_drops_items_with_same_normalized_url() {
        let items = vec![
            item("https://x.com/a?ref=1", 10, false),
            item("https://x.com/a?ref=2", 5, false),
        ];
        let result = dedup_and_sort(items);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn sort_is_newest_first_with_inferred_after_real_dated() {
        let items = vec![
            item("https://x.com/old", 100, false),
            item("https://x.com/new-inferred", 1, true),
            item("https://x.com/new-real", 1, false),
        ];
        let result = dedup_and_sort(items);
        assert_eq!(result[0].url.as_deref(), Some("https://x.com/new-real"));
        assert_eq!(result[1].url.as_deref(), Some("https://x.com/new-inferred"));
        assert_eq!(result[2].url.as_deref(), Some("https://x.com/old"));
    }
}
