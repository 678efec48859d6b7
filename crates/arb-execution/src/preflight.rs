//! Per-leg preflight (spec.md §4.7.1): infer a limit price at the best
//! opposing side, round qty/price to the instrument's lot/tick filters, and
//! optionally verify liquidity at that price before any order is sent.

use crate::error::ExecutionError;
use arb_core::liquidity::LiquidityMode;
use arb_core::{Coin, Instrument, Side, Symbol, VenueId};
use arb_venues::preflight as lot;
use arb_venues::VenueAdapter;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct PreflightLeg {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    pub limit_price: Decimal,
    pub instrument: Instrument,
}

/// `side` is the order side this leg submits: `Buy` to open Long, `Sell` to
/// open Short (spec.md §4.7.1 step 1: "limit price at the best opposing
/// side — ask for Buy, bid for Sell").
pub async fn preflight_leg(
    adapter: &Arc<dyn VenueAdapter>,
    coin: &Coin,
    side: Side,
    notional_usdt: Decimal,
    verify_liquidity: bool,
) -> Result<PreflightLeg, ExecutionError> {
    let venue = adapter.venue();
    let symbol = adapter.normalize_symbol(coin);

    let ticker = adapter
        .get_futures_ticker(coin)
        .await?
        .ok_or_else(|| ExecutionError::PreflightFailed {
            venue,
            symbol: symbol.to_string(),
            reason: "ticker not available".into(),
        })?;
    let ref_price = match side {
        Side::Buy => ticker.ask,
        Side::Sell => ticker.bid,
    };

    let instrument = adapter
        .get_instrument(coin)
        .await?
        .ok_or_else(|| ExecutionError::PreflightFailed {
            venue,
            symbol: symbol.to_string(),
            reason: "instrument metadata not available".into(),
        })?;

    let qty = lot::min_qty_for_notional(&instrument, notional_usdt, ref_price).ok_or_else(|| ExecutionError::PreflightFailed {
        venue,
        symbol: symbol.to_string(),
        reason: format!("qty for notional {notional_usdt} at ref price {ref_price} below minOrderQty {}", instrument.min_order_qty),
    })?;

    let limit_price = lot::round_to_tick(ref_price, instrument.tick_size, side);

    if verify_liquidity {
        let mode = match side {
            Side::Buy => LiquidityMode::EntryLong,
            Side::Sell => LiquidityMode::EntryShort,
        };
        match adapter.check_liquidity(coin, notional_usdt, 50, Decimal::from(30), Decimal::from(50), mode).await? {
            Some(report) if !report.ok => {
                return Err(ExecutionError::PreflightFailed {
                    venue,
                    symbol: symbol.to_string(),
                    reason: format!("liquidity check failed: {}", report.reasons.join(", ")),
                });
            }
            Some(_) => {}
            None => debug!(%venue, %symbol, "preflight liquidity verification: no orderbook available, proceeding"),
        }
    }

    Ok(PreflightLeg {
        venue,
        symbol,
        side,
        qty,
        limit_price,
        instrument,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::market::{ContractType, InstrumentStatus};
    use rust_decimal_macros::dec;

    fn instrument() -> Instrument {
        Instrument {
            symbol: Symbol::new("BTCUSDT"),
            base_coin: Coin::new("BTC"),
            quote_coin: Coin::new("USDT"),
            status: InstrumentStatus::Trading,
            settle_coin: Coin::new("USDT"),
            contract_type: ContractType::Perpetual,
            qty_step: dec!(0.001),
            min_order_qty: dec!(0.001),
            tick_size: dec!(0.1),
            quanto_multiplier: None,
            min_notional: None,
        }
    }

    #[test]
    fn buy_side_rounds_price_up_sell_rounds_down() {
        let inst = instrument();
        assert_eq!(lot::round_to_tick(dec!(100.03), inst.tick_size, Side::Buy), dec!(100.1));
        assert_eq!(lot::round_to_tick(dec!(100.09), inst.tick_size, Side::Sell), dec!(100.0));
    }
}
