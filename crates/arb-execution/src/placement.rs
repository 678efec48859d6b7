//! Order placement and fill verification (spec.md §4.7.3): Bybit prefers
//! the Trade WS `order.create` (correlated by `reqId`) and falls back to
//! signed REST; Gate always goes through signed REST. Fill verification
//! combines the Private Stream (low-latency) with REST polling as a
//! fallback, with a strict full-fill check.

use crate::bybit_rest::BybitPrivateRest;
use crate::config::ExecutionConfig;
use crate::error::ExecutionError;
use crate::gate_rest::GatePrivateRest;
use crate::preflight::PreflightLeg;
use arb_core::{Side, VenueId};
use arb_ws::{BybitPrivateStream, BybitTradeStream};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// A placed leg, not yet confirmed filled.
#[derive(Clone, Debug)]
pub struct PlacedLeg {
    pub venue: VenueId,
    pub order_id: String,
    pub leg: PreflightLeg,
}

/// Outcome of the fill-wait window.
#[derive(Clone, Debug)]
pub struct FillResult {
    pub filled_qty: Decimal,
    pub avg_price: Option<Decimal>,
    pub fully_filled: bool,
}

/// Place a Bybit leg: Trade WS first if ready, REST fallback otherwise
/// (spec.md §4.7.3).
pub async fn place_bybit_leg(
    trade_stream: Option<&BybitTradeStream>,
    rest: &BybitPrivateRest,
    leg: &PreflightLeg,
    reduce_only: bool,
) -> Result<PlacedLeg, ExecutionError> {
    let side = match leg.side {
        Side::Buy => "Buy",
        Side::Sell => "Sell",
    };
    let qty_str = leg.qty.normalize().to_string();

    if let Some(stream) = trade_stream {
        if stream.is_ready() {
            let mut args = serde_json::json!({
                "category": "linear",
                "symbol": leg.symbol.as_str(),
                "side": side,
                "orderType": "Market",
                "qty": qty_str,
            });
            if reduce_only {
                args["reduceOnly"] = serde_json::Value::Bool(true);
            }
            match stream.order_create(args).await {
                Ok(response) => {
                    let ret_code = response.get("retCode").and_then(serde_json::Value::as_i64).unwrap_or(-1);
                    if ret_code == 0 {
                        if let Some(order_id) = response
                            .get("data")
                            .and_then(|d| d.get("orderId"))
                            .and_then(serde_json::Value::as_str)
                        {
                            info!(venue = %VenueId::Bybit, symbol = %leg.symbol, order_id, "order placed via trade ws");
                            return Ok(PlacedLeg {
                                venue: VenueId::Bybit,
                                order_id: order_id.to_string(),
                                leg: leg.clone(),
                            });
                        }
                    }
                    warn!(?response, "bybit trade ws order.create rejected, falling back to rest");
                }
                Err(e) => warn!(error = %e, "bybit trade ws order.create failed, falling back to rest"),
            }
        }
    }

    let order_id = rest.order_create(leg.symbol.as_str(), side, "Market", &qty_str, None).await?;
    info!(venue = %VenueId::Bybit, symbol = %leg.symbol, order_id, "order placed via rest fallback");
    Ok(PlacedLeg {
        venue: VenueId::Bybit,
        order_id,
        leg: leg.clone(),
    })
}

pub async fn place_gate_leg(rest: &GatePrivateRest, leg: &PreflightLeg, reduce_only: bool) -> Result<PlacedLeg, ExecutionError> {
    let quanto_multiplier = leg.instrument.quanto_multiplier.unwrap_or(Decimal::ONE);
    let contracts = (leg.qty / quanto_multiplier).trunc();
    let signed_contracts = match leg.side {
        Side::Buy => contracts,
        Side::Sell => -contracts,
    };
    let size_i64: i64 = signed_contracts
        .to_string()
        .parse()
        .map_err(|_| ExecutionError::PlacementRejected {
            venue: VenueId::Gate,
            reason: format!("contract size {signed_contracts} does not fit in i64"),
        })?;

    let order_id = rest.order_create(leg.symbol.as_str(), size_i64, reduce_only).await?;
    info!(venue = %VenueId::Gate, symbol = %leg.symbol, order_id, "order placed via rest");
    Ok(PlacedLeg {
        venue: VenueId::Gate,
        order_id,
        leg: leg.clone(),
    })
}

/// Poll REST for terminal order state, bounded by `config.fill_poll_attempts`
/// (~6s total at the default 200ms interval). Private-stream confirmation is
/// preferred when available; this is the fallback poller (spec.md §4.7.3).
pub async fn wait_bybit_fill(rest: &BybitPrivateRest, placed: &PlacedLeg, config: &ExecutionConfig) -> FillResult {
    let eps = (placed.leg.qty * config.fill_epsilon_ratio).max(Decimal::new(1, 10));
    for _ in 0..config.fill_poll_attempts {
        if let Some((status, cum_exec, avg_price)) = rest.order_status(placed.leg.symbol.as_str(), &placed.order_id).await {
            if is_terminal_bybit(&status) {
                let fully_filled = cum_exec + eps >= placed.leg.qty;
                return FillResult {
                    filled_qty: cum_exec,
                    avg_price,
                    fully_filled,
                };
            }
        }
        tokio::time::sleep(config.fill_poll_interval).await;
    }
    FillResult {
        filled_qty: Decimal::ZERO,
        avg_price: None,
        fully_filled: false,
    }
}

/// Combine the Private Stream's `OrderFinal` (preferred, low-latency) with
/// the REST poller as a fallback if the stream isn't connected or doesn't
/// resolve before the REST window elapses (spec.md §4.7.3).
pub async fn wait_bybit_fill_combined(
    private_stream: Option<&BybitPrivateStream>,
    rest: &BybitPrivateRest,
    placed: &PlacedLeg,
    config: &ExecutionConfig,
) -> FillResult {
    let eps = (placed.leg.qty * config.fill_epsilon_ratio).max(Decimal::new(1, 10));

    let Some(stream) = private_stream else {
        return wait_bybit_fill(rest, placed, config).await;
    };

    let stream_wait = stream.wait_for_order(placed.order_id.clone());
    tokio::select! {
        biased;
        result = stream_wait => {
            match result {
                Ok(order_final) => {
                    info!(order_id = %placed.order_id, "fill confirmed via private stream");
                    FillResult {
                        filled_qty: order_final.filled_qty,
                        avg_price: order_final.avg_price,
                        fully_filled: order_final.filled_qty + eps >= placed.leg.qty,
                    }
                }
                Err(_) => {
                    warn!(order_id = %placed.order_id, "private stream waiter dropped, falling back to rest poll");
                    wait_bybit_fill(rest, placed, config).await
                }
            }
        }
        result = wait_bybit_fill(rest, placed, config) => result,
    }
}

pub async fn wait_gate_fill(rest: &GatePrivateRest, placed: &PlacedLeg, config: &ExecutionConfig) -> FillResult {
    let quanto_multiplier = placed.leg.instrument.quanto_multiplier.unwrap_or(Decimal::ONE);
    let eps_contracts = Decimal::new(1, 6);
    for _ in 0..config.fill_poll_attempts {
        if let Some((status, filled_contracts, requested_contracts)) = rest.order_status(placed.leg.symbol.as_str(), &placed.order_id).await {
            if is_terminal_gate(&status) {
                let fully_filled = filled_contracts + eps_contracts >= requested_contracts;
                return FillResult {
                    filled_qty: filled_contracts * quanto_multiplier,
                    avg_price: None,
                    fully_filled,
                };
            }
        }
        tokio::time::sleep(config.fill_poll_interval).await;
    }
    FillResult {
        filled_qty: Decimal::ZERO,
        avg_price: None,
        fully_filled: false,
    }
}

fn is_terminal_bybit(status: &str) -> bool {
    matches!(status, "Filled" | "Cancelled" | "Rejected" | "PartiallyFilled")
}

fn is_terminal_gate(status: &str) -> bool {
    matches!(status.to_ascii_lowercase().as_str(), "finished" | "cancelled" | "canceled")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bybit_terminal_states_include_partial_fill() {
        assert!(is_terminal_bybit("PartiallyFilled"));
        assert!(is_terminal_bybit("Filled"));
        assert!(!is_terminal_bybit("New"));
    }

    #[test]
    fn gate_terminal_states_are_case_insensitive() {
        assert!(is_terminal_gate("FINISHED"));
        assert!(is_terminal_gate("cancelled"));
        assert!(!is_terminal_gate("open"));
    }
}
