//! Gate.io v4 private REST client: `SIGN = HMAC_SHA512(secret, method +
//! '\n' + path + '\n' + query + '\n' + sha512(body) + '\n' + timestamp)`
//! (spec.md §4.7.3).

use crate::credentials::Credentials;
use crate::error::ExecutionError;
use crate::signing::gate_rest_signature;
use arb_core::VenueId;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const BASE_URL: &str = "https://api.gateio.ws";

pub struct GatePrivateRest {
    client: reqwest::Client,
    credentials: Credentials,
}

fn now_s() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

impl GatePrivateRest {
    pub fn new(credentials: Credentials) -> Result<Self, ExecutionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;
        Ok(Self { client, credentials })
    }

    async fn request(&self, method: reqwest::Method, path: &str, query: &str, body: &str) -> Result<Value, ExecutionError> {
        let ts = now_s();
        let sign = gate_rest_signature(&self.credentials.api_secret, method.as_str(), path, query, body, ts);

        let url = if query.is_empty() {
            format!("{BASE_URL}{path}")
        } else {
            format!("{BASE_URL}{path}?{query}")
        };
        let mut req = self
            .client
            .request(method.clone(), url)
            .header("KEY", &self.credentials.api_key)
            .header("Timestamp", ts.to_string())
            .header("SIGN", sign)
            .header("Accept", "application/json");
        if method != reqwest::Method::GET {
            req = req.header("Content-Type", "application/json").body(body.to_string());
        }
        let resp = req.send().await.map_err(|e| ExecutionError::Transport(e.to_string()))?;
        decode_response(resp).await
    }

    /// Isolated margin + leverage=1 (spec.md §4.7.2). Gate futures sets
    /// leverage via `/dual_comp/positions/{contract}/leverage` for the
    /// single-position (non-dual) account used here.
    pub async fn set_isolated_and_leverage(&self, contract: &str, leverage: u8) -> Result<(), ExecutionError> {
        let path = format!("/api/v4/futures/usdt/positions/{contract}/leverage");
        let query = format!("leverage={leverage}");
        let data = self.request(reqwest::Method::POST, &path, &query, "").await?;
        if let Some(error_label) = data.get("label").and_then(Value::as_str) {
            return Err(ExecutionError::MarginSetupFailed {
                venue: VenueId::Gate,
                symbol: contract.to_string(),
                reason: error_label.to_string(),
            });
        }
        Ok(())
    }

    /// `POST /api/v4/futures/usdt/orders` — `size` is signed contracts
    /// (positive = buy/long, negative = sell/short), `price: "0"` + `tif:
    /// "ioc"` places a market order (spec.md §4.7.3).
    pub async fn order_create(&self, contract: &str, size_contracts: i64, reduce_only: bool) -> Result<String, ExecutionError> {
        let body = serde_json::json!({
            "contract": contract,
            "size": size_contracts,
            "price": "0",
            "tif": "ioc",
            "reduce_only": reduce_only,
        })
        .to_string();
        let data = self.request(reqwest::Method::POST, "/api/v4/futures/usdt/orders", "", &body).await?;
        if let Some(error_label) = data.get("label").and_then(Value::as_str) {
            return Err(ExecutionError::PlacementRejected {
                venue: VenueId::Gate,
                reason: error_label.to_string(),
            });
        }
        data.get("id")
            .map(|id| id.to_string())
            .ok_or_else(|| ExecutionError::PlacementRejected {
                venue: VenueId::Gate,
                reason: "missing order id in response".into(),
            })
    }

    /// `(status/finish_as, filled_contracts, size_contracts)` for an order.
    pub async fn order_status(&self, contract: &str, order_id: &str) -> Option<(String, Decimal, Decimal)> {
        let path = format!("/api/v4/futures/usdt/orders/{order_id}");
        let query = format!("contract={contract}");
        match self.request(reqwest::Method::GET, &path, &query, "").await {
            Ok(data) => {
                let status = data
                    .get("finish_as")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .or_else(|| data.get("status").and_then(Value::as_str))
                    .unwrap_or("")
                    .to_string();
                let size: Decimal = data.get("size").and_then(Value::as_i64).map(Decimal::from).unwrap_or_default();
                let left: Decimal = data.get("left").and_then(Value::as_i64).map(Decimal::from).unwrap_or_default();
                let filled = (size.abs() - left.abs()).max(Decimal::ZERO);
                if status.is_empty() {
                    None
                } else {
                    Some((status, filled, size.abs()))
                }
            }
            Err(e) => {
                debug!(%contract, %order_id, error = %e, "gate order status: request failed");
                None
            }
        }
    }
}

async fn decode_response(resp: reqwest::Response) -> Result<Value, ExecutionError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| ExecutionError::Transport(e.to_string()))?;
    if !status.is_success() {
        // Gate error bodies are JSON with a `label`/`message`; surface them
        // as the decoded value rather than a bare transport error so callers
        // can read `label`.
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            return Ok(value);
        }
        return Err(ExecutionError::Transport(format!("http {status}: {}", truncate(&text))));
    }
    serde_json::from_str(&text).map_err(|_| ExecutionError::Transport(format!("bad json: {}", truncate(&text))))
}

fn truncate(s: &str) -> String {
    s.chars().take(400).collect()
}
