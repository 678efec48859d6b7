//! Optional X (Twitter) fallback source (spec.md §4.4.3), used only when
//! `X_BEARER_TOKEN` is configured and venue announcements produced no
//! signal. Kept deliberately separate from [`arb_transport::HttpTransport`]:
//! it talks to a single non-venue host with bearer auth and its own
//! query/start-time keyed cache, not a venue's retry/failover policy.

use arb_core::news::NewsSource;
use arb_core::{Coin, NewsItem};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const LOOKBACK_DAYS: i64 = 7;

#[derive(Deserialize)]
struct SearchResponse {
    data: Option<Vec<Tweet>>,
}

#[derive(Deserialize)]
struct Tweet {
    text: String,
    created_at: Option<DateTime<Utc>>,
}

pub struct XSource {
    client: reqwest::Client,
    bearer_token: String,
    max_results: u32,
    ttl: Duration,
    cache: Mutex<HashMap<(String, i64), (Instant, Vec<NewsItem>)>>,
}

impl XSource {
    pub fn new(bearer_token: String, max_results: u32, ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
            max_results,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn find_delisting_news(&self, coin: &Coin, exchange_names: &[&str]) -> Vec<NewsItem> {
        self.search(coin, "(delist OR delisting OR delisted)", exchange_names).await
    }

    pub async fn find_security_news(&self, coin: &Coin, exchange_names: &[&str]) -> Vec<NewsItem> {
        self.search(coin, "(hack OR hacked OR exploit OR breach OR phishing OR scam)", exchange_names)
            .await
    }

    async fn search(&self, coin: &Coin, condition: &str, exchange_names: &[&str]) -> Vec<NewsItem> {
        let start_time = Utc::now() - ChronoDuration::days(LOOKBACK_DAYS);
        let query = build_query(coin, condition, exchange_names);
        let cache_key = (query.clone(), start_time.timestamp() / 60);

        if let Some((fetched_at, items)) = self.cache.lock().get(&cache_key) {
            if fetched_at.elapsed() < self.ttl {
                return items.clone();
            }
        }

        let items = self.fetch(&query, start_time).await.unwrap_or_default();
        self.cache.lock().insert(cache_key, (Instant::now(), items.clone()));
        items
    }

    async fn fetch(&self, query: &str, start_time: DateTime<Utc>) -> Option<Vec<NewsItem>> {
        let max_results = self.max_results.to_string();
        let resp = self
            .client
            .get(SEARCH_URL)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query),
                ("start_time", &start_time.to_rfc3339()),
                ("max_results", &max_results),
            ])
            .send()
            .await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "X search request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "X search returned non-success status");
            return None;
        }
        let parsed: SearchResponse = resp.json().await.ok()?;
        let now = Utc::now();
        Some(
            parsed
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|tweet| NewsItem {
                    title: tweet.text.chars().take(120).collect(),
                    body: tweet.text,
                    url: None,
                    source: NewsSource::X,
                    published_at: tweet.created_at.unwrap_or(now),
                    published_at_inferred: tweet.created_at.is_none(),
                    tags: vec![],
                })
                .collect(),
        )
    }
}

fn build_query(coin: &Coin, condition: &str, exchange_names: &[&str]) -> String {
    let coin_str = coin.as_str();
    let exchanges = if exchange_names.is_empty() {
        String::new()
    } else {
        format!(" ({})", exchange_names.join(" OR "))
    };
    format!(
        "({coin_str} OR {coin_str}USDT OR \"{coin_str}/USDT\") {condition}{exchanges} -is:retweet"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_includes_coin_forms_and_excludes_retweets() {
        let query = build_query(&Coin::new("btc"), "(delist)", &["Bybit", "Gate"]);
        assert!(query.contains("BTC OR BTCUSDT OR \"BTC/USDT\""));
        assert!(query.contains("-is:retweet"));
        assert!(query.contains("Bybit OR Gate"));
    }
}
