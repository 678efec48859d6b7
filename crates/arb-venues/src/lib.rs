//! Venue Adapter Layer: one [`adapter::VenueAdapter`] implementation per
//! exchange, all normalized onto `arb-core`'s shared data model (spec.md
//! §4.2). This is the crate every other component above it depends on for
//! "talk to an exchange" — scanners, the evaluator, and the execution engine
//! never construct a `reqwest` request or parse exchange JSON directly.

pub mod adapter;
pub mod binance;
pub mod bingx;
pub mod bitget;
pub mod bybit;
pub mod gate;
pub mod lbank;
pub mod mexc;
pub mod okx;
pub mod parsing;
pub mod preflight;
pub mod symbols;
pub mod xt;

pub use adapter::{VenueAdapter, VenueRegistry};

use arb_core::VenueError;
use std::sync::Arc;

/// Construct a [`VenueRegistry`] with every venue adapter registered, using
/// each adapter's default (production) HTTP transport configuration
/// (spec.md §6.4 `ENABLED_VENUES` still governs which of these a scanner run
/// actually iterates over).
pub fn build_default_registry() -> Result<VenueRegistry, VenueError> {
    let mut registry = VenueRegistry::new();
    registry.register(Arc::new(bybit::BybitAdapter::new()?));
    registry.register(Arc::new(gate::GateAdapter::new()?));
    registry.register(Arc::new(mexc::MexcAdapter::new()?));
    registry.register(Arc::new(xt::XtAdapter::new()?));
    registry.register(Arc::new(binance::BinanceAdapter::new()?));
    registry.register(Arc::new(bitget::BitgetAdapter::new()?));
    registry.register(Arc::new(okx::OkxAdapter::new()?));
    registry.register(Arc::new(bingx::BingxAdapter::new()?));
    registry.register(Arc::new(lbank::LbankAdapter::new()?));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::VenueId;

    #[test]
    fn default_registry_registers_all_nine_venues() {
        let registry = build_default_registry().unwrap();
        for venue in VenueId::ALL {
            assert!(registry.get(venue).is_some(), "missing adapter for {venue}");
        }
    }
}
