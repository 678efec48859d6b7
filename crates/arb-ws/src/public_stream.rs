//! Bybit public linear market stream: one connection per symbol, subscribed
//! to `orderbook.1.SYM`, `publicTrade.SYM`, `tickers.SYM` (spec.md §4.3.1).

use crate::{backoff::ReconnectBackoff, market_state::MarketState, timeout::IdleTimeoutStream};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde_json::Value;
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

pub const BYBIT_PUBLIC_LINEAR_URL: &str = "wss://stream.bybit.com/v5/public/linear";
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// A running public-stream client for one symbol. Holds the shared
/// [`MarketState`] the rest of the system reads from, and a `stop` signal
/// that tears the task down on cancellation.
pub struct BybitPublicStream {
    pub state: Arc<MarketState>,
    stop_tx: watch::Sender<bool>,
}

impl BybitPublicStream {
    /// Spawn the connect/subscribe/reconnect loop for `symbol` in the
    /// background, returning a handle with live market state.
    pub fn spawn(symbol: String) -> Self {
        let state = Arc::new(MarketState::new());
        let (stop_tx, stop_rx) = watch::channel(false);

        let task_state = state.clone();
        tokio::spawn(run_loop(symbol, task_state, stop_rx));

        Self { state, stop_tx }
    }

    pub fn is_ready(&self, max_age: Duration) -> bool {
        self.state.is_ready(max_age)
    }

    /// Close the socket and stop reconnecting.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

async fn run_loop(symbol: String, state: Arc<MarketState>, mut stop_rx: watch::Receiver<bool>) {
    let mut backoff = ReconnectBackoff::default();

    loop {
        if *stop_rx.borrow() {
            return;
        }

        match connect_async(BYBIT_PUBLIC_LINEAR_URL).await {
            Ok((ws, _)) => {
                info!(%symbol, "bybit public stream connected");
                backoff.reset();
                let (mut write, read) = ws.split();

                let sub = serde_json::json!({
                    "op": "subscribe",
                    "args": [
                        format!("orderbook.1.{symbol}"),
                        format!("publicTrade.{symbol}"),
                        format!("tickers.{symbol}"),
                    ],
                });
                if let Err(e) = write.send(Message::text(sub.to_string())).await {
                    warn!(%symbol, error = %e, "failed to send subscribe request");
                    sleep_backoff(&mut backoff, &mut stop_rx).await;
                    continue;
                }

                let mut timed = IdleTimeoutStream::new(read, IDLE_TIMEOUT);
                loop {
                    tokio::select! {
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() {
                                let _ = write.send(Message::Close(None)).await;
                                return;
                            }
                        }
                        msg = timed.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => handle_message(&state, &text),
                                Some(Ok(Message::Ping(payload))) => {
                                    let _ = write.send(Message::Pong(payload)).await;
                                }
                                Some(Ok(Message::Close(frame))) => {
                                    warn!(%symbol, ?frame, "bybit public stream closed by server");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    warn!(%symbol, error = %e, "bybit public stream error");
                                    break;
                                }
                                None => {
                                    debug!(%symbol, "bybit public stream idle timeout or end of stream");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                warn!(%symbol, error = %e, "bybit public stream connect failed");
            }
        }

        if *stop_rx.borrow() {
            return;
        }
        sleep_backoff(&mut backoff, &mut stop_rx).await;
    }
}

async fn sleep_backoff(backoff: &mut ReconnectBackoff, stop_rx: &mut watch::Receiver<bool>) {
    let delay = backoff.next();
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = stop_rx.changed() => {}
    }
}

fn handle_message(state: &MarketState, text: &str) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return;
    };
    let Some(topic) = value.get("topic").and_then(Value::as_str) else {
        return;
    };

    if topic.starts_with("orderbook.1.") {
        handle_orderbook(state, &value);
    } else if topic.starts_with("publicTrade.") {
        handle_trade(state, &value);
    } else if topic.starts_with("tickers.") {
        handle_ticker(state, &value);
    }
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    value.as_str().and_then(|s| Decimal::from_str(s).ok())
}

fn handle_orderbook(state: &MarketState, value: &Value) {
    let parsed = (|| -> Option<(Decimal, Decimal)> {
        let data = value.get("data")?;
        let bid = data.get("b")?.as_array()?.first()?.as_array()?.first().and_then(parse_decimal)?;
        let ask = data.get("a")?.as_array()?.first()?.as_array()?.first().and_then(parse_decimal)?;
        Some((bid, ask))
    })();
    if let Some((bid, ask)) = parsed {
        state.update_bid_ask(bid, ask);
    }
}

fn handle_trade(state: &MarketState, value: &Value) {
    let price = (|| -> Option<Decimal> {
        let data = value.get("data")?.as_array()?;
        data.last()?.get("p").and_then(parse_decimal)
    })();
    if let Some(price) = price {
        state.update_trade(price);
    }
}

fn handle_ticker(state: &MarketState, value: &Value) {
    let price = value.get("data").and_then(|data| data.get("lastPrice")).and_then(parse_decimal);
    if let Some(price) = price {
        state.update_ticker(price);
    }
}
