//! Pooled HTTP transport shared by every venue adapter (spec.md §4.1).
//!
//! One [`HttpTransport`] per venue wraps a long-lived `reqwest::Client`
//! (connection-pooled, so TCP/TLS handshakes are reused across requests),
//! applies a bounded-exponential retry policy to connect/timeout failures,
//! and — for venues with a secondary host (MEXC) — fails over to it after
//! the primary host's attempts are exhausted. 403/429 responses are returned
//! to the caller without retry, logged once per session to avoid repeating
//! noisy rate-limit/WAF warnings.

use arb_core::{error::VenueError, venue::VenueId};
use serde::de::DeserializeOwned;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
    time::Duration,
};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub pool_timeout: Duration,
    /// Extra attempts after the first, per host (spec.md §4.1).
    pub retries: usize,
    pub retry_backoff: Duration,
    /// Caps simultaneous in-flight requests for venues with strict rate
    /// limits (MEXC defaults to 5).
    pub max_inflight: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(8),
            pool_timeout: Duration::from_secs(5),
            retries: 1,
            retry_backoff: Duration::from_millis(350),
            max_inflight: 32,
        }
    }
}

struct Host {
    client: reqwest::Client,
    base: Url,
}

/// A venue's pooled HTTP client, with optional secondary-domain failover.
pub struct HttpTransport {
    venue: VenueId,
    primary: Host,
    secondary: Option<Host>,
    semaphore: Arc<Semaphore>,
    config: TransportConfig,
    warned_once: AtomicBool,
}

impl HttpTransport {
    pub fn new(venue: VenueId, base_url: &str, config: TransportConfig) -> Result<Self, VenueError> {
        let primary = Self::build_host(base_url, &config)?;
        Ok(Self {
            venue,
            primary,
            secondary: None,
            semaphore: Arc::new(Semaphore::new(config.max_inflight)),
            config,
            warned_once: AtomicBool::new(false),
        })
    }

    /// Attach a secondary base URL (e.g. MEXC's `futures.mexc.com` fallback).
    /// Each attempt against the secondary has its own full retry budget.
    pub fn with_secondary(mut self, secondary_base_url: &str) -> Result<Self, VenueError> {
        self.secondary = Some(Self::build_host(secondary_base_url, &self.config)?);
        Ok(self)
    }

    fn build_host(base_url: &str, config: &TransportConfig) -> Result<Host, VenueError> {
        let base = Url::parse(base_url).map_err(|e| VenueError::ConfigError {
            message: format!("invalid base url {base_url}: {e}"),
        })?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_idle_timeout(config.pool_timeout)
            .build()
            .map_err(|e| VenueError::ConfigError {
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Host { client, base })
    }

    /// `GET` `path` against the venue, decoding the JSON body into `T`.
    /// Returns `Ok(None)` for: not-found-shaped responses, rate-limit/WAF
    /// responses, or a JSON decode failure on the final attempt — all are
    /// logged, none are surfaced as hard errors, per spec.md §7.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, VenueError> {
        let _permit = self.semaphore.acquire().await.map_err(|_| VenueError::ConfigError {
            message: "transport semaphore closed".into(),
        })?;

        if let Some(value) = self.try_host(&self.primary, path, query).await? {
            return Ok(Some(value));
        }
        if let Some(secondary) = &self.secondary {
            if let Some(value) = self.try_host(secondary, path, query).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    async fn try_host<T: DeserializeOwned>(
        &self,
        host: &Host,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, VenueError> {
        let attempts = 1 + self.config.retries;
        let mut url = host
            .base
            .join(path)
            .map_err(|e| VenueError::ConfigError {
                message: format!("invalid request path {path}: {e}"),
            })?;
        url.query_pairs_mut().extend_pairs(query.iter().copied());

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;
            match host.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.as_u16() == 403 || status.as_u16() == 429 {
                        self.warn_rate_limited(status.as_u16());
                        return Ok(None);
                    }
                    if !status.is_success() {
                        debug!(venue = %self.venue, %status, %url, "http non-success response");
                        return Ok(None);
                    }
                    return match resp.json::<T>().await {
                        Ok(value) => Ok(Some(value)),
                        Err(e) => {
                            if is_last {
                                warn!(venue = %self.venue, error = %e, "json decode failed on last attempt");
                                Ok(None)
                            } else {
                                debug!(venue = %self.venue, error = %e, "json decode failed, retrying");
                                tokio::time::sleep(self.config.retry_backoff * (attempt as u32 + 1)).await;
                                continue;
                            }
                        }
                    };
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if is_last {
                        warn!(venue = %self.venue, error = %e, %url, "transient network error on last attempt");
                        return Ok(None);
                    }
                    debug!(venue = %self.venue, error = %e, attempt, "retrying after transient network error");
                    tokio::time::sleep(self.config.retry_backoff * (attempt as u32 + 1)).await;
                }
                Err(e) => {
                    warn!(venue = %self.venue, error = %e, %url, "unexpected transport error");
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    /// `GET` `url` (an absolute URL, typically an announcement/article page
    /// outside the venue's API host) and return the decoded response body.
    /// Same not-found/rate-limit/retry policy as [`Self::get_json`], used by
    /// the News/Risk Engine for HTML fetches (spec.md §4.4.1).
    pub async fn get_text_absolute(&self, url: &str) -> Result<Option<String>, VenueError> {
        let _permit = self.semaphore.acquire().await.map_err(|_| VenueError::ConfigError {
            message: "transport semaphore closed".into(),
        })?;
        let url = Url::parse(url).map_err(|e| VenueError::ConfigError {
            message: format!("invalid absolute url {url}: {e}"),
        })?;

        let attempts = 1 + self.config.retries;
        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;
            match self.primary.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.as_u16() == 403 || status.as_u16() == 429 {
                        self.warn_rate_limited(status.as_u16());
                        return Ok(None);
                    }
                    if !status.is_success() {
                        debug!(venue = %self.venue, %status, %url, "http non-success response");
                        return Ok(None);
                    }
                    return match resp.text().await {
                        Ok(body) => Ok(Some(body)),
                        Err(e) => {
                            warn!(venue = %self.venue, error = %e, "failed reading response body");
                            Ok(None)
                        }
                    };
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if is_last {
                        warn!(venue = %self.venue, error = %e, %url, "transient network error on last attempt");
                        return Ok(None);
                    }
                    tokio::time::sleep(self.config.retry_backoff * (attempt as u32 + 1)).await;
                }
                Err(e) => {
                    warn!(venue = %self.venue, error = %e, %url, "unexpected transport error");
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    fn warn_rate_limited(&self, status: u16) {
        if !self.warned_once.swap(true, Ordering::Relaxed) {
            warn!(venue = %self.venue, status, "possible rate-limit/WAF event (further occurrences suppressed this session)");
        } else {
            debug!(venue = %self.venue, status, "possible rate-limit/WAF event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 1);
    }

    #[tokio::test]
    async fn unreachable_host_returns_none_not_error() {
        let transport = HttpTransport::new(
            VenueId::Bybit,
            "http://127.0.0.1:1",
            TransportConfig {
                connect_timeout: Duration::from_millis(50),
                read_timeout: Duration::from_millis(50),
                retries: 0,
                retry_backoff: Duration::from_millis(1),
                ..TransportConfig::default()
            },
        )
        .unwrap();

        let result: Result<Option<serde_json::Value>, VenueError> =
            transport.get_json("/v5/market/tickers", &[]).await;
        assert!(matches!(result, Ok(None)));
    }
}
