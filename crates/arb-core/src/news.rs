use crate::venue::VenueId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of a [`NewsItem`]: a venue's own announcements/HTML, or the
/// optional X (Twitter) fallback.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum NewsSource {
    Venue(VenueId),
    X,
}

/// One announcement/article candidate, post keyword-and-coin matching.
/// Dedup key is the normalized URL (query/fragment stripped); when `url` is
/// absent, the first 200 chars of `title` (see `arb_news::dedup`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub source: NewsSource,
    pub published_at: DateTime<Utc>,
    /// `true` when the listing page exposed no date and `published_at` was
    /// set to "now" to avoid dropping the item from the lookback window.
    pub published_at_inferred: bool,
    pub tags: Vec<String>,
}

impl NewsItem {
    /// Dedup key used by `arb_news::dedup::dedup_by_url`.
    pub fn dedup_key(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => self.title.chars().take(200).collect(),
        }
    }
}
