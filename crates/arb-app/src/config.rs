//! Operator-facing configuration (spec.md §6.4): every key in the table
//! there, with documented defaults, constructed by [`ScannerConfig::from_env`].
//! `.env` file loading itself stays out of scope (spec.md Non-goals) — this
//! reads whatever `std::env::var` already sees, which is the interface such
//! a loader would populate.

use arb_core::{Coin, VenueId};
use arb_evaluator::EvaluatorConfig;
use arb_execution::ExecutionConfig;
use arb_scanner::ScannerLoopConfig;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// The complete operator-facing configuration, split at construction time
/// into the narrower slices each subsystem actually consumes
/// ([`ScannerLoopConfig`], [`EvaluatorConfig`], [`ExecutionConfig`]) — those
/// crates have no dependency on `arb-app` (spec.md §9 "Cyclic handles").
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub loop_config: ScannerLoopConfig,
    pub evaluator_config: EvaluatorConfig,
    pub execution_config: ExecutionConfig,
    /// `NEWS_CACHE_TTL_SEC`, default 180s.
    pub news_cache_ttl: Duration,
    /// `X_BEARER_TOKEN`, enables the optional X fallback source when set.
    pub x_bearer_token: Option<String>,
    /// `X_NEWS_CACHE_TTL_SEC`, default 180s.
    pub x_news_cache_ttl: Duration,
    /// `X_NEWS_MAX_RESULTS`, default 10.
    pub x_news_max_results: usize,
    /// `BINANCE_COOKIE`, optional WAF-bypass cookie for article prefetch.
    pub binance_cookie: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            loop_config: ScannerLoopConfig::default(),
            evaluator_config: EvaluatorConfig::default(),
            execution_config: ExecutionConfig::default(),
            news_cache_ttl: Duration::from_secs(180),
            x_bearer_token: None,
            x_news_cache_ttl: Duration::from_secs(180),
            x_news_max_results: 10,
            binance_cookie: None,
        }
    }
}

impl ScannerConfig {
    /// Reads every key from spec.md §6.4 via `std::env::var`, falling back
    /// to [`Default`] for anything unset or unparsable (a malformed value is
    /// logged at warn and the default kept, never a hard failure).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_decimal("MIN_SPREAD", &mut config.loop_config.min_spread);
        env_decimal("MIN_FUNDING_LONG_FILTER_FOR_LOG", &mut config.loop_config.min_funding_long_filter_for_log);
        env_decimal("MAX_PRICE_SPREAD", &mut config.loop_config.max_price_spread);
        env_u64("SCAN_INTERVAL_SEC", &mut config.loop_config.scan_interval_sec);
        env_usize("COIN_BATCH_SIZE", &mut config.loop_config.coin_batch_size);
        env_usize("MAX_CONCURRENCY", &mut config.loop_config.max_concurrency);
        env_usize("ANALYSIS_MAX_CONCURRENCY", &mut config.loop_config.analysis_max_concurrency);

        env_decimal("MIN_FUNDING_SPREAD", &mut config.evaluator_config.min_funding_spread);
        env_i64("MIN_TIME_TO_PAY", &mut config.evaluator_config.min_time_to_pay);
        env_decimal("SCAN_COIN_INVEST", &mut config.evaluator_config.notional_usdt);

        env_u64_secs("NEWS_CACHE_TTL_SEC", &mut config.news_cache_ttl);
        env_u64_secs("X_NEWS_CACHE_TTL_SEC", &mut config.x_news_cache_ttl);
        env_usize("X_NEWS_MAX_RESULTS", &mut config.x_news_max_results);

        env_u64("BYBIT_RECV_WINDOW", &mut config.execution_config.bybit_recv_window_ms);

        config.loop_config.exclude_coins = env_coin_set("EXCLUDE_COINS");
        config.loop_config.exclude_exchanges = env_venue_set("EXCLUDE_EXCHANGES");

        config.x_bearer_token = std::env::var("X_BEARER_TOKEN").ok().filter(|s| !s.is_empty());
        config.binance_cookie = std::env::var("BINANCE_COOKIE").ok().filter(|s| !s.is_empty());

        config
    }
}

fn env_parsed<T: FromStr>(key: &str, target: &mut T) {
    let Ok(raw) = std::env::var(key) else { return };
    match raw.parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "could not parse env var, keeping default"),
    }
}

fn env_decimal(key: &str, target: &mut Decimal) {
    env_parsed(key, target);
}

fn env_u64(key: &str, target: &mut u64) {
    env_parsed(key, target);
}

fn env_i64(key: &str, target: &mut i64) {
    env_parsed(key, target);
}

fn env_usize(key: &str, target: &mut usize) {
    env_parsed(key, target);
}

fn env_u64_secs(key: &str, target: &mut Duration) {
    let mut secs = target.as_secs();
    env_u64(key, &mut secs);
    *target = Duration::from_secs(secs);
}

fn env_coin_set(key: &str) -> HashSet<Coin> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(|s| Coin::new(&s.to_ascii_uppercase())).collect())
        .unwrap_or_default()
}

fn env_venue_set(key: &str) -> HashSet<VenueId> {
    std::env::var(key)
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| {
                    let venue = VenueId::parse(s);
                    if venue.is_none() {
                        warn!(value = s, "unknown venue in EXCLUDE_EXCHANGES, ignoring");
                    }
                    venue
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_subsystem_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.news_cache_ttl, Duration::from_secs(180));
        assert_eq!(config.x_news_max_results, 10);
        assert!(config.x_bearer_token.is_none());
    }

    #[test]
    fn env_coin_set_uppercases_and_trims() {
        std::env::set_var("ARB_APP_TEST_COINS", " btc , eth ,");
        let set = env_coin_set("ARB_APP_TEST_COINS");
        std::env::remove_var("ARB_APP_TEST_COINS");
        assert!(set.contains(&Coin::new("BTC")));
        assert!(set.contains(&Coin::new("ETH")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn env_venue_set_skips_unknown_entries() {
        std::env::set_var("ARB_APP_TEST_VENUES", "bybit,deribit,gate");
        let set = env_venue_set("ARB_APP_TEST_VENUES");
        std::env::remove_var("ARB_APP_TEST_VENUES");
        assert!(set.contains(&VenueId::Bybit));
        assert!(set.contains(&VenueId::Gate));
        assert_eq!(set.len(), 2);
    }
}
