//! Bybit announcement API fetch strategy (spec.md §4.4.1). The only venue
//! with a structured announcements endpoint; every other venue goes through
//! [`crate::html`].

use arb_core::news::NewsSource;
use arb_core::{NewsItem, VenueId};
use arb_transport::HttpTransport;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tracing::debug;

const PAGE_LIMIT: u32 = 50;
const MAX_PAGES: u32 = 20;

#[derive(Deserialize)]
struct AnnouncementsResponse {
    result: Option<AnnouncementsResult>,
}

#[derive(Deserialize)]
struct AnnouncementsResult {
    list: Vec<AnnouncementEntry>,
}

#[derive(Deserialize)]
struct AnnouncementEntry {
    title: String,
    description: Option<String>,
    url: String,
    #[serde(rename = "dateTimestamp")]
    date_timestamp_ms: i64,
    tags: Option<Vec<String>>,
}

/// Page through `/v5/announcements/index` newest-first, stopping early once
/// an entry older than `now - days_back - 6h` is seen (spec.md §4.4.1).
pub async fn fetch(transport: &HttpTransport, days_back: i64, now: DateTime<Utc>) -> Result<Vec<NewsItem>, arb_core::VenueError> {
    let cutoff = now - ChronoDuration::days(days_back) - ChronoDuration::hours(6);
    let mut items = Vec::new();

    for page in 1..=MAX_PAGES {
        let page_str = page.to_string();
        let limit_str = PAGE_LIMIT.to_string();
        let data: Option<AnnouncementsResponse> = transport
            .get_json(
                "/v5/announcements/index",
                &[("locale", "en-US"), ("page", &page_str), ("limit", &limit_str)],
            )
            .await?;
        let Some(data) = data else { break };
        let Some(result) = data.result else { break };
        if result.list.is_empty() {
            break;
        }

        let mut crossed_cutoff = false;
        for entry in result.list {
            let published_at = DateTime::from_timestamp_millis(entry.date_timestamp_ms).unwrap_or(now);
            if published_at < cutoff {
                crossed_cutoff = true;
                break;
            }
            items.push(NewsItem {
                title: entry.title,
                body: entry.description.unwrap_or_default(),
                url: Some(entry.url),
                source: NewsSource::Venue(VenueId::Bybit),
                published_at,
                published_at_inferred: false,
                tags: entry.tags.unwrap_or_default(),
            });
        }
        if crossed_cutoff {
            break;
        }
    }

    debug!(venue = "bybit", count = items.len(), "fetched announcements");
    Ok(items)
}
