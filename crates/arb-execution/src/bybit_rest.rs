//! Bybit V5 private REST client: signed headers per spec.md §4.7.3
//! (`X-BAPI-API-KEY`, `X-BAPI-TIMESTAMP`, `X-BAPI-RECV-WINDOW`,
//! `X-BAPI-SIGN`), used as the fallback order path when the Trade WS isn't
//! ready, plus margin/leverage setup and fill polling.

use crate::credentials::Credentials;
use crate::error::ExecutionError;
use crate::signing::bybit_rest_signature;
use arb_core::VenueId;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const BASE_URL: &str = "https://api.bybit.com";

pub struct BybitPrivateRest {
    client: reqwest::Client,
    credentials: Credentials,
    recv_window_ms: u64,
}

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
}

impl BybitPrivateRest {
    pub fn new(credentials: Credentials, recv_window_ms: u64) -> Result<Self, ExecutionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            credentials,
            recv_window_ms,
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ExecutionError> {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let query = serde_urlencoded::to_string(&sorted).map_err(|e| ExecutionError::Transport(e.to_string()))?;
        let ts = now_ms();
        let sign = bybit_rest_signature(&self.credentials.api_secret, ts, &self.credentials.api_key, self.recv_window_ms, &query);

        let url = format!("{BASE_URL}{path}?{query}");
        let resp = self
            .client
            .get(url)
            .header("X-BAPI-API-KEY", &self.credentials.api_key)
            .header("X-BAPI-TIMESTAMP", ts.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window_ms.to_string())
            .header("X-BAPI-SIGN", sign)
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;
        decode_response(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ExecutionError> {
        let body_json = body.to_string();
        let ts = now_ms();
        let sign = bybit_rest_signature(&self.credentials.api_secret, ts, &self.credentials.api_key, self.recv_window_ms, &body_json);

        let url = format!("{BASE_URL}{path}");
        let resp = self
            .client
            .post(url)
            .header("X-BAPI-API-KEY", &self.credentials.api_key)
            .header("X-BAPI-TIMESTAMP", ts.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window_ms.to_string())
            .header("X-BAPI-SIGN", sign)
            .header("Content-Type", "application/json")
            .body(body_json)
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;
        decode_response(resp).await
    }

    /// Set isolated margin mode and 1x leverage on `symbol` before the first
    /// order (spec.md §4.7.2). Failure here is fatal — no order is sent.
    pub async fn set_isolated_and_leverage(&self, symbol: &str, leverage: u8) -> Result<(), ExecutionError> {
        let leverage_str = leverage.to_string();
        let margin = self
            .post(
                "/v5/position/switch-isolated",
                &serde_json::json!({
                    "category": "linear",
                    "symbol": symbol,
                    "tradeMode": 1,
                    "buyLeverage": leverage_str,
                    "sellLeverage": leverage_str,
                }),
            )
            .await?;
        check_ret_code_tolerant(&margin, symbol)?;

        let leverage_resp = self
            .post(
                "/v5/position/set-leverage",
                &serde_json::json!({
                    "category": "linear",
                    "symbol": symbol,
                    "buyLeverage": leverage_str,
                    "sellLeverage": leverage_str,
                }),
            )
            .await?;
        check_ret_code_tolerant(&leverage_resp, symbol)
    }

    /// REST fallback for `/v5/order/create` when the Trade WS isn't ready
    /// (spec.md §4.7.3).
    pub async fn order_create(&self, symbol: &str, side: &str, order_type: &str, qty: &str, price: Option<&str>) -> Result<String, ExecutionError> {
        let mut body = serde_json::json!({
            "category": "linear",
            "symbol": symbol,
            "side": side,
            "orderType": order_type,
            "qty": qty,
        });
        if let Some(price) = price {
            body["price"] = Value::String(price.to_string());
            body["timeInForce"] = Value::String("GTC".into());
        }
        let data = self.post("/v5/order/create", &body).await?;
        let ret_code = data.get("retCode").and_then(Value::as_i64).unwrap_or(-1);
        if ret_code != 0 {
            let ret_msg = data.get("retMsg").and_then(Value::as_str).unwrap_or("unknown error");
            return Err(ExecutionError::PlacementRejected {
                venue: VenueId::Bybit,
                reason: format!("retCode={ret_code} retMsg={ret_msg}"),
            });
        }
        data.get("result")
            .and_then(|r| r.get("orderId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ExecutionError::PlacementRejected {
                venue: VenueId::Bybit,
                reason: "missing orderId in response".into(),
            })
    }

    /// `(status, cumExecQty, avgPrice)` from whichever of `order/realtime`
    /// (open orders) / `order/history` (terminal orders) has the order.
    /// Bybit's realtime endpoint can stop returning a filled/cancelled
    /// order, so history is consulted as the fallback (spec.md §4.7.3).
    pub async fn order_status(&self, symbol: &str, order_id: &str) -> Option<(String, Decimal, Option<Decimal>)> {
        for path in ["/v5/order/realtime", "/v5/order/history"] {
            let params = [
                ("category", "linear".to_string()),
                ("symbol", symbol.to_string()),
                ("orderId", order_id.to_string()),
            ];
            match self.get(path, &params).await {
                Ok(data) if data.get("retCode").and_then(Value::as_i64) == Some(0) => {
                    if let Some(item) = data
                        .get("result")
                        .and_then(|r| r.get("list"))
                        .and_then(Value::as_array)
                        .and_then(|list| list.first())
                    {
                        let status = item.get("orderStatus").and_then(Value::as_str).unwrap_or("").to_string();
                        let cum_exec = item
                            .get("cumExecQty")
                            .and_then(Value::as_str)
                            .and_then(|s| s.parse::<Decimal>().ok())
                            .unwrap_or_default();
                        let avg_price = item.get("avgPrice").and_then(Value::as_str).and_then(|s| s.parse::<Decimal>().ok());
                        if !status.is_empty() {
                            return Some((status, cum_exec, avg_price));
                        }
                    }
                }
                Ok(data) => debug!(%path, ?data, "bybit order status: non-zero retCode"),
                Err(e) => debug!(%path, error = %e, "bybit order status: request failed"),
            }
        }
        None
    }
}

async fn decode_response(resp: reqwest::Response) -> Result<Value, ExecutionError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| ExecutionError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(ExecutionError::Transport(format!("http {status}: {}", truncate(&text))));
    }
    serde_json::from_str(&text).map_err(|_| ExecutionError::Transport(format!("bad json: {}", truncate(&text))))
}

fn truncate(s: &str) -> String {
    s.chars().take(400).collect()
}

/// Treats margin-mode-unchanged errors (Bybit returns a distinct retCode
/// when isolated mode or the target leverage is already set) as success,
/// mirroring the tolerant fallback behavior of the original implementation.
fn check_ret_code_tolerant(data: &Value, symbol: &str) -> Result<(), ExecutionError> {
    let ret_code = data.get("retCode").and_then(Value::as_i64).unwrap_or(-1);
    if ret_code == 0 {
        return Ok(());
    }
    let ret_msg = data.get("retMsg").and_then(Value::as_str).unwrap_or("");
    if ret_msg.to_ascii_lowercase().contains("not modified") || ret_code == 110043 {
        warn!(%symbol, ret_code, ret_msg, "bybit margin/leverage already at target, continuing");
        return Ok(());
    }
    Err(ExecutionError::MarginSetupFailed {
        venue: VenueId::Bybit,
        symbol: symbol.to_string(),
        reason: format!("retCode={ret_code} retMsg={ret_msg}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ret_code_zero_is_ok() {
        let data = serde_json::json!({"retCode": 0});
        assert!(check_ret_code_tolerant(&data, "BTCUSDT").is_ok());
    }

    #[test]
    fn ret_code_110043_is_tolerated() {
        let data = serde_json::json!({"retCode": 110043, "retMsg": "leverage not modified"});
        assert!(check_ret_code_tolerant(&data, "BTCUSDT").is_ok());
    }

    #[test]
    fn other_ret_codes_are_fatal() {
        let data = serde_json::json!({"retCode": 10001, "retMsg": "bad request"});
        assert!(check_ret_code_tolerant(&data, "BTCUSDT").is_err());
    }
}
