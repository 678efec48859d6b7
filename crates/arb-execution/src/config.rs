//! Execution-local thresholds and timing constants (spec.md §4.7, §6.4).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ExecutionConfig {
    /// `BYBIT_RECV_WINDOW`, default 5000ms.
    pub bybit_recv_window_ms: u64,
    /// Leverage set on both legs before the first order (spec.md §4.7.2).
    pub leverage: u8,
    /// Poll interval while waiting for fill confirmation via REST
    /// (`order/realtime` + `order/history`), spec.md §4.7.3.
    pub fill_poll_interval: Duration,
    /// Total fill-wait window, ~6s per spec.md §4.7.3.
    pub fill_poll_attempts: usize,
    /// Strict full-fill epsilon: `cumExecQty + eps >= qty`.
    pub fill_epsilon_ratio: Decimal,
    /// Monitor-until-close poll interval, spec.md §4.7.4.
    pub monitor_poll_interval: Duration,
    /// Default per-leg fee in USDT used when real executions can't be read
    /// back (spec.md's `_calculate_pnl_usdt` default of 0.05 per leg).
    pub default_fee_usdt: Decimal,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            bybit_recv_window_ms: 5_000,
            leverage: 1,
            fill_poll_interval: Duration::from_millis(200),
            fill_poll_attempts: 30,
            fill_epsilon_ratio: dec!(0.00000001),
            monitor_poll_interval: Duration::from_secs(1),
            default_fee_usdt: dec!(0.05),
        }
    }
}
