//! Bybit private stream: auth, `order`/`execution`/`position` subscriptions,
//! per-order waiters resolved on terminal status, and a `PositionKey -> size`
//! cache (spec.md §4.3.2).

use crate::backoff::ReconnectBackoff;
use arb_core::order::{OrderStatus, PositionKey, PositionSide};
use futures_util::{SinkExt, StreamExt};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value;
use sha2::Sha256;
use std::{
    collections::HashMap,
    str::FromStr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::{oneshot, watch, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

pub const BYBIT_PRIVATE_URL: &str = "wss://stream.bybit.com/v5/private";

/// Final resolved status for a waited-on order.
#[derive(Clone, Debug)]
pub struct OrderFinal {
    pub order_id: String,
    pub status: OrderStatus,
    pub filled_qty: Decimal,
    pub avg_price: Option<Decimal>,
}

#[derive(Default)]
struct PositionCache {
    sizes: HashMap<PositionKey, Decimal>,
    last_update_ms: HashMap<PositionKey, i64>,
}

struct Shared {
    waiters: Mutex<HashMap<String, oneshot::Sender<OrderFinal>>>,
    positions: Mutex<PositionCache>,
    any_update: Notify,
    last_msg_ms: Mutex<Option<i64>>,
}

pub struct BybitPrivateStream {
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
}

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
}

fn sign(secret: &str, expires_ms: i64) -> String {
    let payload = format!("GET/realtime{expires_ms}");
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

impl BybitPrivateStream {
    pub fn spawn(api_key: String, api_secret: String) -> Self {
        let shared = Arc::new(Shared {
            waiters: Mutex::new(HashMap::new()),
            positions: Mutex::new(PositionCache::default()),
            any_update: Notify::new(),
            last_msg_ms: Mutex::new(None),
        });
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::spawn(run_loop(api_key, api_secret, shared.clone(), stop_rx));

        Self { shared, stop_tx }
    }

    /// Register a waiter for `order_id`; resolved when a terminal status
    /// arrives on the private stream.
    pub fn wait_for_order(&self, order_id: String) -> oneshot::Receiver<OrderFinal> {
        let (tx, rx) = oneshot::channel();
        self.shared.waiters.lock().insert(order_id, tx);
        rx
    }

    pub fn position_size(&self, key: &PositionKey) -> Option<Decimal> {
        self.shared.positions.lock().sizes.get(key).copied()
    }

    pub fn last_update_ms(&self, key: &PositionKey) -> Option<i64> {
        self.shared.positions.lock().last_update_ms.get(key).copied()
    }

    pub async fn wait_any_update(&self) {
        self.shared.any_update.notified().await;
    }

    pub fn staleness_ms(&self) -> Option<i64> {
        self.shared.last_msg_ms.lock().map(|ts| (now_ms() - ts).max(0))
    }

    /// Stop the stream; all pending waiters are dropped (receivers observe a
    /// closed channel, surfaced by callers as a "stopped" error).
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        self.shared.waiters.lock().clear();
    }
}

async fn run_loop(
    api_key: String,
    api_secret: String,
    shared: Arc<Shared>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut backoff = ReconnectBackoff::default();

    loop {
        if *stop_rx.borrow() {
            return;
        }

        match connect_async(BYBIT_PRIVATE_URL).await {
            Ok((ws, _)) => {
                let (mut write, mut read) = ws.split();

                let expires = now_ms() + 20_000;
                let signature = sign(&api_secret, expires);
                let auth = serde_json::json!({"op": "auth", "args": [api_key, expires, signature]});
                if write.send(Message::text(auth.to_string())).await.is_err() {
                    sleep_backoff(&mut backoff, &mut stop_rx).await;
                    continue;
                }
                let sub = serde_json::json!({"op": "subscribe", "args": ["order", "execution", "position"]});
                if write.send(Message::text(sub.to_string())).await.is_err() {
                    sleep_backoff(&mut backoff, &mut stop_rx).await;
                    continue;
                }

                info!("bybit private stream authenticated and subscribed");
                backoff.reset();

                loop {
                    tokio::select! {
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() {
                                let _ = write.send(Message::Close(None)).await;
                                return;
                            }
                        }
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    *shared.last_msg_ms.lock() = Some(now_ms());
                                    handle_message(&shared, &text);
                                }
                                Some(Ok(Message::Ping(payload))) => {
                                    let _ = write.send(Message::Pong(payload)).await;
                                }
                                Some(Ok(Message::Close(frame))) => {
                                    warn!(?frame, "bybit private stream closed by server");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    warn!(error = %e, "bybit private stream error");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "bybit private stream connect failed"),
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

fn parse_decimal(value: &Value) -> Option<Decimal> {
    value.as_str().and_then(|s| Decimal::from_str(s).ok())
}

fn parse_status(raw: &str) -> Option<OrderStatus> {
    Some(match raw {
        "New" | "Created" => OrderStatus::New,
        "PartiallyFilled" => OrderStatus::PartiallyFilled,
        "Filled" => OrderStatus::Filled,
        "Cancelled" | "Deactivated" => OrderStatus::Cancelled,
        "Rejected" => OrderStatus::Rejected,
        _ => return None,
    })
}

fn handle_message(shared: &Shared, text: &str) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return;
    };
    let Some(topic) = value.get("topic").and_then(Value::as_str) else {
        return;
    };
    let Some(data) = value.get("data").and_then(Value::as_array) else {
        return;
    };

    match topic {
        "order" => {
            for entry in data {
                handle_order_entry(shared, entry);
            }
        }
        "position" => {
            for entry in data {
                handle_position_entry(shared, entry);
            }
            shared.any_update.notify_waiters();
        }
        _ => {}
    }
}

fn handle_order_entry(shared: &Shared, entry: &Value) {
    let Some(order_id) = entry.get("orderId").and_then(Value::as_str) else {
        return;
    };
    let Some(status) = entry.get("orderStatus").and_then(Value::as_str).and_then(parse_status) else {
        return;
    };
    if !status.is_terminal() {
        return;
    }
    let filled_qty = entry.get("cumExecQty").and_then(parse_decimal).unwrap_or_default();
    let avg_price = entry.get("avgPrice").and_then(parse_decimal);

    if let Some(tx) = shared.waiters.lock().remove(order_id) {
        let _ = tx.send(OrderFinal {
            order_id: order_id.to_string(),
            status,
            filled_qty,
            avg_price,
        });
    }
}

fn handle_position_entry(shared: &Shared, entry: &Value) {
    let Some(symbol) = entry.get("symbol").and_then(Value::as_str) else {
        return;
    };
    let Some(position_idx) = entry.get("positionIdx").and_then(Value::as_u64) else {
        return;
    };
    let Some(side_raw) = entry.get("side").and_then(Value::as_str) else {
        return;
    };
    let side = match side_raw {
        "Buy" => PositionSide::Buy,
        "Sell" => PositionSide::Sell,
        _ => return,
    };
    let Some(size) = entry.get("size").and_then(parse_decimal) else {
        return;
    };

    let key = PositionKey {
        symbol: symbol.into(),
        position_idx: position_idx as u8,
        side,
    };

    let mut cache = shared.positions.lock();
    cache.sizes.insert(key.clone(), size);
    cache.last_update_ms.insert(key, now_ms());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let sig1 = sign("secret", 1_700_000_000_000);
        let sig2 = sign("secret", 1_700_000_000_000);
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 64);
    }

    #[test]
    fn parse_status_maps_terminal_states() {
        assert_eq!(parse_status("Filled"), Some(OrderStatus::Filled));
        assert_eq!(parse_status("Rejected"), Some(OrderStatus::Rejected));
        assert_eq!(parse_status("Cancelled"), Some(OrderStatus::Cancelled));
        assert_eq!(parse_status("bogus"), None);
    }
}
