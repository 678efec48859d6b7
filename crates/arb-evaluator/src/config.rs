//! Evaluator-local thresholds (spec.md §6.4 keys this crate consumes).
//! `arb-app::config::ScannerConfig` is the full operator-facing config;
//! this is the narrower slice the evaluator itself needs, so the crate has
//! no dependency on `arb-app`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Clone, Debug)]
pub struct EvaluatorConfig {
    /// `MIN_FUNDING_SPREAD`.
    pub min_funding_spread: Decimal,
    /// `MIN_TIME_TO_PAY`, minutes.
    pub min_time_to_pay: i64,
    /// `SCAN_COIN_INVEST`, notional USDT used for the liquidity check.
    pub notional_usdt: Decimal,
    pub liquidity_depth: usize,
    pub max_spread_bps: Decimal,
    pub max_impact_bps: Decimal,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            min_funding_spread: dec!(1.5),
            min_time_to_pay: 60,
            notional_usdt: dec!(50),
            liquidity_depth: 50,
            max_spread_bps: dec!(30),
            max_impact_bps: dec!(50),
        }
    }
}
