//! Binary entrypoint (spec.md §2 "H. Input/Config/Sinks"): wires the Venue
//! Adapter Layer, News/Risk Engine and Opportunity Evaluator into the
//! Scanner Loops, running until Ctrl-C (spec.md §5 "cancellation propagates
//! from the root task"). Credential-bearing Execution Engine construction is
//! best-effort: a missing `{VENUE}_API_KEY/_API_SECRET` pair just leaves
//! that venue unavailable for opening positions, it never blocks scanning.

use arb_app::ScannerConfig;
use arb_core::VenueId;
use arb_execution::{CredentialStore, Credentials, ExecutionEngine};
use arb_news::NewsEngine;
use arb_transport::{HttpTransport, TransportConfig};
use arb_ws::{BybitPrivateStream, BybitTradeStream};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const BYBIT_TRADE_RECV_WINDOW_MS: u64 = 5_000;
const BYBIT_REFERER: &str = "arb-app";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let config = ScannerConfig::from_env();

    let registry = Arc::new(arb_venues::build_default_registry()?);
    let news = build_news_engine(&config);
    let sink = arb_app::LoggingSink;

    let execution_engine = build_execution_engine(registry.clone(), &config);
    if execution_engine.is_some() {
        tracing::info!("execution engine ready (bybit/gate credentials present)");
    } else {
        tracing::info!("no execution credentials configured, scanning only");
    }

    tracing::info!("starting scan loop");
    tokio::select! {
        _ = arb_scanner::run_forever(&registry, &config.loop_config, &config.evaluator_config, &news, &sink, "default") => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}

fn build_news_engine(config: &ScannerConfig) -> NewsEngine {
    let mut news = NewsEngine::new(config.news_cache_ttl);

    match HttpTransport::new(VenueId::Bybit, arb_venues::bybit::BASE_URL, TransportConfig::default()) {
        Ok(transport) => news.register_bybit(transport),
        Err(e) => tracing::warn!(error = %e, "could not build news transport for bybit"),
    }

    if let Some(token) = &config.x_bearer_token {
        let x_source = arb_news::XSource::new(token.clone(), config.x_news_max_results as u32, config.x_news_cache_ttl);
        news = news.with_x_source(x_source);
    }

    news
}

/// Only Bybit and Gate are execution-capable (spec.md §4.7.3's signed
/// REST/Trade-WS paths are venue-specific); the engine is only constructed
/// once both sets of credentials are present.
fn build_execution_engine(registry: Arc<arb_venues::VenueRegistry>, config: &ScannerConfig) -> Option<ExecutionEngine> {
    let bybit_key = std::env::var("BYBIT_API_KEY").ok()?;
    let bybit_secret = std::env::var("BYBIT_API_SECRET").ok()?;
    let gate_key = std::env::var("GATE_API_KEY").ok()?;
    let gate_secret = std::env::var("GATE_API_SECRET").ok()?;

    let mut credentials = CredentialStore::new();
    credentials.insert(
        VenueId::Bybit,
        Credentials {
            api_key: bybit_key.clone(),
            api_secret: bybit_secret.clone(),
        },
    );
    credentials.insert(
        VenueId::Gate,
        Credentials {
            api_key: gate_key,
            api_secret: gate_secret,
        },
    );

    let trade_stream = BybitTradeStream::spawn(bybit_key.clone(), bybit_secret.clone(), BYBIT_TRADE_RECV_WINDOW_MS, BYBIT_REFERER.to_string());
    let private_stream = BybitPrivateStream::spawn(bybit_key, bybit_secret);

    Some(ExecutionEngine::new(registry, credentials, config.execution_config.clone(), Some(trade_stream), Some(private_stream)))
}
