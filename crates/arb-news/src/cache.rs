//! Per-`(coin, venue)` news cache (spec.md §4.5.1), TTL `NEWS_CACHE_TTL_SEC`
//! (default 180s).

use arb_core::{Coin, NewsItem, VenueId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
pub struct NewsLookup {
    pub delisting: Vec<NewsItem>,
    pub security: Vec<NewsItem>,
}

struct Entry {
    fetched_at: Instant,
    lookup: NewsLookup,
}

pub struct NewsCache {
    ttl: Duration,
    entries: Mutex<HashMap<(Coin, VenueId), Entry>>,
}

impl NewsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, coin: &Coin, venue: VenueId) -> Option<NewsLookup> {
        let entries = self.entries.lock();
        entries
            .get(&(coin.clone(), venue))
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.lookup.clone())
    }

    pub fn put(&self, coin: Coin, venue: VenueId, lookup: NewsLookup) {
        self.entries.lock().insert(
            (coin, venue),
            Entry {
                fetched_at: Instant::now(),
                lookup,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_returns_same_lookup_within_ttl() {
        let cache = NewsCache::new(Duration::from_secs(180));
        let coin = Coin::new("BTC");
        cache.put(coin.clone(), VenueId::Bybit, NewsLookup::default());
        assert!(cache.get(&coin, VenueId::Bybit).is_some());
    }

    #[test]
    fn get_misses_for_unseen_key() {
        let cache = NewsCache::new(Duration::from_secs(180));
        assert!(cache.get(&Coin::new("ETH"), VenueId::Gate).is_none());
    }

    #[test]
    fn get_misses_once_ttl_elapsed() {
        let cache = NewsCache::new(Duration::from_millis(0));
        let coin = Coin::new("BTC");
        cache.put(coin.clone(), VenueId::Bybit, NewsLookup::default());
        std::thread::sleep(Duration::from_millis(1));
        assert!(cache.get(&coin, VenueId::Bybit).is_none());
    }
}
