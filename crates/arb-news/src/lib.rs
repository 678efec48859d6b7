//! News/Risk Engine (spec.md §4.4): per-venue announcement fetch (Bybit's
//! API, HTML scraping everywhere else), coin/keyword matching with
//! conditional article prefetch, and the `(coin, venue)` result cache
//! consumed by the Opportunity Evaluator.

pub mod budget;
pub mod bybit_source;
pub mod cache;
pub mod dates;
pub mod dedup;
pub mod html;
pub mod keywords;
pub mod matching;
pub mod x_source;

use arb_core::{news::NewsSource, Coin, NewsItem, VenueError, VenueId};
use arb_transport::HttpTransport;
use budget::PrefetchBudget;
use cache::{NewsCache, NewsLookup};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub use x_source::XSource;

const DEFAULT_DAYS_BACK: i64 = 14;

/// Per-venue fetch strategy: Bybit has a structured API, every other venue
/// is scraped off one or more listing pages (spec.md §4.4.1).
enum FetchStrategy {
    BybitApi,
    Html(Vec<Url>),
}

pub struct NewsEngine {
    transports: HashMap<VenueId, HttpTransport>,
    strategies: HashMap<VenueId, FetchStrategy>,
    cache: NewsCache,
    x_source: Option<XSource>,
    days_back: i64,
}

impl NewsEngine {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            transports: HashMap::new(),
            strategies: HashMap::new(),
            cache: NewsCache::new(cache_ttl),
            x_source: None,
            days_back: DEFAULT_DAYS_BACK,
        }
    }

    pub fn with_x_source(mut self, x_source: XSource) -> Self {
        self.x_source = Some(x_source);
        self
    }

    /// Register Bybit's API-based announcement fetch.
    pub fn register_bybit(&mut self, transport: HttpTransport) {
        self.transports.insert(VenueId::Bybit, transport);
        self.strategies.insert(VenueId::Bybit, FetchStrategy::BybitApi);
    }

    /// Register an HTML-scraped venue with its category listing URLs.
    pub fn register_html_venue(&mut self, venue: VenueId, transport: HttpTransport, listing_urls: Vec<Url>) {
        self.transports.insert(venue, transport);
        self.strategies.insert(venue, FetchStrategy::Html(listing_urls));
    }

    /// Look up delisting/security news for `(coin, venue)`, using the cache
    /// when fresh (spec.md §4.5.1). `budget` is shared across one scan
    /// cycle's worth of lookups, capping total article prefetches.
    pub async fn lookup(&self, coin: &Coin, venue: VenueId, budget: &PrefetchBudget) -> Result<NewsLookup, VenueError> {
        if let Some(cached) = self.cache.get(coin, venue) {
            return Ok(cached);
        }

        let Some(transport) = self.transports.get(&venue) else {
            return Ok(NewsLookup::default());
        };
        let Some(strategy) = self.strategies.get(&venue) else {
            return Ok(NewsLookup::default());
        };

        let mut candidates = self.fetch_candidates(venue, transport, strategy).await?;

        let mut delisting = Vec::new();
        for candidate in candidates.iter_mut() {
            if let Some(item) = self
                .resolve(transport, candidate, coin, keywords::DELISTING_KEYWORDS, budget)
                .await
            {
                delisting.push(item);
            }
        }
        let delisting = dedup::dedup_and_sort(delisting);

        // Security news only fetched when no delisting signal was found
        // (spec.md §4.5.1 "cheaper path").
        let security = if delisting.is_empty() {
            let mut security = Vec::new();
            for candidate in candidates.iter_mut() {
                if let Some(item) = self
                    .resolve(transport, candidate, coin, keywords::SECURITY_KEYWORDS, budget)
                    .await
                {
                    security.push(item);
                }
            }
            dedup::dedup_and_sort(security)
        } else {
            Vec::new()
        };

        let (delisting, security) = if delisting.is_empty() && security.is_empty() {
            self.fallback_to_x(coin, venue, delisting, security).await
        } else {
            (delisting, security)
        };

        let lookup = NewsLookup { delisting, security };
        self.cache.put(coin.clone(), venue, lookup.clone());
        Ok(lookup)
    }

    async fn fallback_to_x(&self, coin: &Coin, venue: VenueId, delisting: Vec<NewsItem>, security: Vec<NewsItem>) -> (Vec<NewsItem>, Vec<NewsItem>) {
        let Some(x_source) = &self.x_source else {
            return (delisting, security);
        };
        let exchange_names = [venue.as_str()];
        let delisting = x_source.find_delisting_news(coin, &exchange_names).await;
        let security = if delisting.is_empty() {
            x_source.find_security_news(coin, &exchange_names).await
        } else {
            Vec::new()
        };
        (delisting, security)
    }

    async fn fetch_candidates(
        &self,
        venue: VenueId,
        transport: &HttpTransport,
        strategy: &FetchStrategy,
    ) -> Result<Vec<Candidate>, VenueError> {
        match strategy {
            FetchStrategy::BybitApi => {
                let items = bybit_source::fetch(transport, self.days_back, chrono::Utc::now()).await?;
                Ok(items.into_iter().map(Candidate::from_api_item).collect())
            }
            FetchStrategy::Html(listing_urls) => {
                let mut candidates = Vec::new();
                for listing_url in listing_urls {
                    let Some(body) = transport.get_text_absolute(listing_url.as_str()).await? else {
                        continue;
                    };
                    for raw in html::extract_candidates(listing_url, &body) {
                        candidates.push(Candidate::from_raw(venue, raw));
                    }
                }
                Ok(candidates)
            }
        }
    }

    async fn resolve(
        &self,
        transport: &HttpTransport,
        candidate: &mut Candidate,
        coin: &Coin,
        keyword_set: &[&str],
        budget: &PrefetchBudget,
    ) -> Option<NewsItem> {
        let text = format!("{} {}", candidate.title, candidate.body);
        let mut result = matching::evaluate(&text, coin.as_str(), keyword_set);

        if matching::needs_prefetch(&result) && !candidate.prefetched && budget.try_consume() {
            if self.prefetch(transport, candidate).await {
                candidate.prefetched = true;
                let text = format!("{} {}", candidate.title, candidate.body);
                result = matching::evaluate(&text, coin.as_str(), keyword_set);
            }
        }

        if !matching::passes(&result, &candidate.tags) {
            return None;
        }

        Some(NewsItem {
            title: candidate.title.clone(),
            body: candidate.body.clone(),
            url: Some(candidate.url.clone()),
            source: candidate.source.clone(),
            published_at: candidate.published_at.unwrap_or_else(chrono::Utc::now),
            published_at_inferred: candidate.published_at.is_none(),
            tags: candidate.tags.clone(),
        })
    }

    async fn prefetch(&self, transport: &HttpTransport, candidate: &mut Candidate) -> bool {
        let body = match transport.get_text_absolute(&candidate.url).await {
            Ok(Some(body)) => Some(body),
            _ => {
                let normalized = dedup::normalize_url(&candidate.url);
                transport.get_text_absolute(&normalized).await.ok().flatten()
            }
        };
        let Some(body) = body else {
            debug!(url = %candidate.url, "conditional prefetch failed");
            return false;
        };
        let (article_body, published_at) = html::extract_article(&body);
        candidate.body = article_body;
        if published_at.is_some() {
            candidate.published_at = published_at;
        }
        true
    }
}

/// Internal mutable working state for one article candidate across the
/// match -> maybe-prefetch -> re-match pipeline.
struct Candidate {
    title: String,
    body: String,
    url: String,
    source: NewsSource,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    tags: Vec<String>,
    prefetched: bool,
}

impl Candidate {
    fn from_raw(venue: VenueId, raw: html::RawCandidate) -> Self {
        Self {
            title: raw.title,
            body: raw.body_snippet,
            url: raw.url,
            source: NewsSource::Venue(venue),
            published_at: raw.published_at,
            tags: vec![],
            prefetched: false,
        }
    }

    fn from_api_item(item: NewsItem) -> Self {
        Self {
            title: item.title,
            body: item.body,
            url: item.url.unwrap_or_default(),
            source: item.source,
            published_at: Some(item.published_at),
            tags: item.tags,
            prefetched: true,
        }
    }
}
