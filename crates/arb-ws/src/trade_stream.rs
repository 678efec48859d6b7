//! Bybit WS Trade channel: request/response order placement correlated by
//! `reqId` (spec.md §4.3.3).

use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use serde_json::Value;
use sha2::Sha256;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::{oneshot, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use uuid::Uuid;

pub const BYBIT_TRADE_URL: &str = "wss://stream.bybit.com/v5/trade";
const PING_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum TradeWsError {
    #[error("trade ws not ready")]
    NotReady,
    #[error("trade ws stopped")]
    Stopped,
    #[error("trade ws send failed: {0}")]
    Send(String),
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

struct Shared {
    pending: Mutex<HashMap<String, oneshot::Sender<Value>>>,
    ready: Mutex<bool>,
    outbound: Mutex<Option<tokio::sync::mpsc::UnboundedSender<Message>>>,
}

/// Request/response WS channel for `order.create`/amend/cancel, plus a
/// background 20s ping task that triggers full reconnect on failure.
pub struct BybitTradeStream {
    shared: Arc<Shared>,
    recv_window_ms: u64,
    referer: String,
    stop_tx: watch::Sender<bool>,
}

impl BybitTradeStream {
    pub fn spawn(api_key: String, api_secret: String, recv_window_ms: u64, referer: String) -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(HashMap::new()),
            ready: Mutex::new(false),
            outbound: Mutex::new(None),
        });
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::spawn(run_loop(api_key, api_secret, shared.clone(), stop_rx));

        Self {
            shared,
            recv_window_ms,
            referer,
            stop_tx,
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.shared.ready.lock()
    }

    /// Submit an `order.create` request, correlated by a fresh UUID `reqId`.
    /// Resolves with the venue's raw JSON response.
    pub async fn order_create(&self, args: Value) -> Result<Value, TradeWsError> {
        if !self.is_ready() {
            return Err(TradeWsError::NotReady);
        }
        let req_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(req_id.clone(), tx);

        let ts = now_ms();
        let header = serde_json::json!({
            "X-BAPI-TIMESTAMP": ts.to_string(),
            "X-BAPI-RECV-WINDOW": self.recv_window_ms.to_string(),
            "Referer": self.referer,
        });
        let request = serde_json::json!({
            "reqId": req_id,
            "header": header,
            "op": "order.create",
            "args": [args],
        });

        let sender = self.shared.outbound.lock().clone();
        let Some(sender) = sender else {
            self.shared.pending.lock().remove(&req_id);
            return Err(TradeWsError::NotReady);
        };
        sender
            .send(Message::text(request.to_string()))
            .map_err(|e| TradeWsError::Send(e.to_string()))?;

        rx.await.map_err(|_| TradeWsError::Stopped)
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        for (_, tx) in self.shared.pending.lock().drain() {
            let _ = tx.send(serde_json::json!({"error": "stopped"}));
        }
    }

}

async fn run_loop(
    api_key: String,
    api_secret: String,
    shared: Arc<Shared>,
    mut stop_rx: watch::Receiver<bool>,
) {
    use futures_util::{SinkExt, StreamExt};

    loop {
        if *stop_rx.borrow() {
            return;
        }

        match connect_async(BYBIT_TRADE_URL).await {
            Ok((ws, _)) => {
                let (mut write, mut read) = ws.split();
                let expires = now_ms() + 10_000;
                let signature = sign(&api_secret, expires);
                let auth = serde_json::json!({"op": "auth", "args": [api_key, expires.to_string(), signature]});
                if write.send(Message::text(auth.to_string())).await.is_err() {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }

                let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
                *shared.outbound.lock() = Some(out_tx);
                info!("bybit trade ws connected, awaiting auth ack");

                let mut ping_interval = tokio::time::interval(PING_INTERVAL);
                ping_interval.tick().await; // first tick fires immediately

                loop {
                    tokio::select! {
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() {
                                let _ = write.send(Message::Close(None)).await;
                                *shared.outbound.lock() = None;
                                *shared.ready.lock() = false;
                                return;
                            }
                        }
                        Some(out) = out_rx.recv() => {
                            if write.send(out).await.is_err() {
                                break;
                            }
                        }
                        _ = ping_interval.tick() => {
                            let ping = serde_json::json!({"op": "ping"});
                            if write.send(Message::text(ping.to_string())).await.is_err() {
                                warn!("bybit trade ws ping failed, reconnecting");
                                break;
                            }
                        }
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => handle_message(&shared, &text),
                                Some(Ok(Message::Close(frame))) => {
                                    warn!(?frame, "bybit trade ws closed by server");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    warn!(error = %e, "bybit trade ws error");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }

                *shared.outbound.lock() = None;
                *shared.ready.lock() = false;
                fail_all_pending(&shared);
            }
            Err(e) => warn!(error = %e, "bybit trade ws connect failed"),
        }

        if *stop_rx.borrow() {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn fail_all_pending(shared: &Shared) {
    for (_, tx) in shared.pending.lock().drain() {
        let _ = tx.send(serde_json::json!({"error": "disconnected"}));
    }
}

fn handle_message(shared: &Shared, text: &str) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return;
    };

    if value.get("op").and_then(Value::as_str) == Some("auth") {
        let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
        *shared.ready.lock() = success;
        if !success {
            warn!(?value, "bybit trade ws auth failed");
        }
        return;
    }

    if let Some(req_id) = value.get("reqId").and_then(Value::as_str) {
        if let Some(tx) = shared.pending.lock().remove(req_id) {
            let _ = tx.send(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_signature_is_64_hex_chars() {
        let sig = sign("secret", 1_700_000_000_000);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
