//! Top-level Execution Engine orchestrator (spec.md §4.7): preflight both
//! legs, set margin/leverage, place concurrently, verify fills, and (if
//! both legs filled) hand off to [`crate::monitor::monitor_until_close`].

use crate::bybit_rest::BybitPrivateRest;
use crate::config::ExecutionConfig;
use crate::credentials::CredentialStore;
use crate::error::ExecutionError;
use crate::gate_rest::GatePrivateRest;
use crate::monitor::{self, MonitorOutcome, OpenPrices};
use crate::placement::{self, FillResult, PlacedLeg};
use crate::preflight::{self, PreflightLeg};
use arb_core::{Coin, Side, Sink, VenueId};
use arb_venues::VenueRegistry;
use arb_ws::{BybitPrivateStream, BybitTradeStream};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// Outcome of opening both legs of an arbitrage position (spec.md §4.7.3).
pub enum OpenOutcome {
    /// Both legs filled (within epsilon); monitoring was started or skipped
    /// per `monitor` parameter.
    Opened {
        long: PlacedLeg,
        short: PlacedLeg,
        long_fill: FillResult,
        short_fill: FillResult,
    },
    /// One or both legs failed to fully fill; the engine does not attempt
    /// to auto-unwind, matching the original's behaviour of surfacing the
    /// unhedged leg for operator action (spec.md §4.7.3 edge cases).
    Unhedged {
        long: Option<(PlacedLeg, FillResult)>,
        short: Option<(PlacedLeg, FillResult)>,
    },
}

/// Ties together venue adapters, Bybit's WS channels, credentials and REST
/// clients for opening and monitoring a Long/Short pair (spec.md §4.7).
pub struct ExecutionEngine {
    registry: std::sync::Arc<VenueRegistry>,
    credentials: CredentialStore,
    config: ExecutionConfig,
    bybit_trade_stream: Option<BybitTradeStream>,
    bybit_private_stream: Option<BybitPrivateStream>,
}

impl ExecutionEngine {
    pub fn new(
        registry: std::sync::Arc<VenueRegistry>,
        credentials: CredentialStore,
        config: ExecutionConfig,
        bybit_trade_stream: Option<BybitTradeStream>,
        bybit_private_stream: Option<BybitPrivateStream>,
    ) -> Self {
        Self {
            registry,
            credentials,
            config,
            bybit_trade_stream,
            bybit_private_stream,
        }
    }

    fn bybit_rest(&self) -> Result<BybitPrivateRest, ExecutionError> {
        let creds = self
            .credentials
            .get(VenueId::Bybit)
            .ok_or(ExecutionError::MissingCredentials { venue: VenueId::Bybit })?;
        BybitPrivateRest::new(creds.clone(), self.config.bybit_recv_window_ms)
    }

    fn gate_rest(&self) -> Result<GatePrivateRest, ExecutionError> {
        let creds = self
            .credentials
            .get(VenueId::Gate)
            .ok_or(ExecutionError::MissingCredentials { venue: VenueId::Gate })?;
        GatePrivateRest::new(creds.clone())
    }

    /// Opens a Long/Short pair for `coin` using a confirmed [`Opportunity`]'s
    /// venues (spec.md §4.7.1-3). Only Bybit and Gate are execution-capable
    /// per the ambient stack's supported-venues table; other venue pairs are
    /// rejected with `MissingCredentials`.
    pub async fn open_long_short(&self, coin: &Coin, long_venue: VenueId, short_venue: VenueId, notional_usdt: Decimal) -> Result<OpenOutcome, ExecutionError> {
        let long_adapter = self
            .registry
            .get(long_venue)
            .ok_or(ExecutionError::MissingCredentials { venue: long_venue })?
            .clone();
        let short_adapter = self
            .registry
            .get(short_venue)
            .ok_or(ExecutionError::MissingCredentials { venue: short_venue })?
            .clone();

        let (long_leg, short_leg) = tokio::try_join!(
            preflight::preflight_leg(&long_adapter, coin, Side::Buy, notional_usdt, true),
            preflight::preflight_leg(&short_adapter, coin, Side::Sell, notional_usdt, true),
        )?;

        self.setup_margin(long_venue, long_leg.symbol.as_str()).await?;
        self.setup_margin(short_venue, short_leg.symbol.as_str()).await?;

        let (long_placed, short_placed) = tokio::try_join!(self.place_leg(&long_leg, false), self.place_leg(&short_leg, false))?;

        let (long_fill, short_fill) = tokio::join!(self.wait_fill(&long_placed), self.wait_fill(&short_placed));

        if long_fill.fully_filled && short_fill.fully_filled {
            info!(%coin, %long_venue, %short_venue, "both legs fully filled");
            Ok(OpenOutcome::Opened {
                long: long_placed,
                short: short_placed,
                long_fill,
                short_fill,
            })
        } else {
            if !long_fill.fully_filled {
                warn!(%coin, venue = %long_venue, filled = %long_fill.filled_qty, requested = %long_leg.qty, "long leg not fully filled, unhedged");
            }
            if !short_fill.fully_filled {
                warn!(%coin, venue = %short_venue, filled = %short_fill.filled_qty, requested = %short_leg.qty, "short leg not fully filled, unhedged");
            }
            Ok(OpenOutcome::Unhedged {
                long: Some((long_placed, long_fill)),
                short: Some((short_placed, short_fill)),
            })
        }
    }

    async fn setup_margin(&self, venue: VenueId, symbol: &str) -> Result<(), ExecutionError> {
        match venue {
            VenueId::Bybit => self.bybit_rest()?.set_isolated_and_leverage(symbol, self.config.leverage).await,
            VenueId::Gate => self.gate_rest()?.set_isolated_and_leverage(symbol, self.config.leverage).await,
            other => Err(ExecutionError::MissingCredentials { venue: other }),
        }
    }

    async fn place_leg(&self, leg: &PreflightLeg, reduce_only: bool) -> Result<PlacedLeg, ExecutionError> {
        match leg.venue {
            VenueId::Bybit => placement::place_bybit_leg(self.bybit_trade_stream.as_ref(), &self.bybit_rest()?, leg, reduce_only).await,
            VenueId::Gate => placement::place_gate_leg(&self.gate_rest()?, leg, reduce_only).await,
            other => Err(ExecutionError::MissingCredentials { venue: other }),
        }
    }

    async fn wait_fill(&self, placed: &PlacedLeg) -> FillResult {
        match placed.venue {
            VenueId::Bybit => match self.bybit_rest() {
                Ok(rest) => placement::wait_bybit_fill_combined(self.bybit_private_stream.as_ref(), &rest, placed, &self.config).await,
                Err(e) => {
                    error!(error = %e, "bybit rest client unavailable for fill wait");
                    FillResult {
                        filled_qty: Decimal::ZERO,
                        avg_price: None,
                        fully_filled: false,
                    }
                }
            },
            VenueId::Gate => match self.gate_rest() {
                Ok(rest) => placement::wait_gate_fill(&rest, placed, &self.config).await,
                Err(e) => {
                    error!(error = %e, "gate rest client unavailable for fill wait");
                    FillResult {
                        filled_qty: Decimal::ZERO,
                        avg_price: None,
                        fully_filled: false,
                    }
                }
            },
            _ => FillResult {
                filled_qty: Decimal::ZERO,
                avg_price: None,
                fully_filled: false,
            },
        }
    }

    /// Monitor an opened position until the closing spread crosses
    /// `close_threshold_pct`, then place reducing orders to close both legs
    /// (spec.md §4.7.4).
    #[allow(clippy::too_many_arguments)]
    pub async fn monitor_and_close(
        &self,
        coin: &Coin,
        long_venue: VenueId,
        short_venue: VenueId,
        qty: Decimal,
        open: OpenPrices,
        close_threshold_pct: Option<Decimal>,
        fee_long: Decimal,
        fee_short: Decimal,
        sink: &dyn Sink,
        sink_channel: &str,
        stop: tokio::sync::watch::Receiver<bool>,
    ) -> Result<Option<(FillResult, FillResult)>, ExecutionError> {
        let long_adapter = self.registry.get(long_venue).ok_or(ExecutionError::MissingCredentials { venue: long_venue })?.clone();
        let short_adapter = self.registry.get(short_venue).ok_or(ExecutionError::MissingCredentials { venue: short_venue })?.clone();

        let outcome = monitor::monitor_until_close(
            &coin.to_string(),
            long_venue,
            short_venue,
            &long_adapter,
            &short_adapter,
            coin,
            qty,
            open,
            close_threshold_pct,
            fee_long,
            fee_short,
            self.config.monitor_poll_interval,
            sink,
            sink_channel,
            stop,
        )
        .await;

        match outcome {
            MonitorOutcome::Cancelled => Ok(None),
            MonitorOutcome::ThresholdReached(_) => {
                let long_leg = preflight::preflight_leg(&long_adapter, coin, Side::Sell, qty * open.ask_long_open, false).await?;
                let short_leg = preflight::preflight_leg(&short_adapter, coin, Side::Buy, qty * open.bid_short_open, false).await?;

                let (long_placed, short_placed) = tokio::try_join!(self.place_leg(&long_leg, true), self.place_leg(&short_leg, true))?;
                let (long_fill, short_fill) = tokio::join!(self.wait_fill(&long_placed), self.wait_fill(&short_placed));

                if !long_fill.fully_filled {
                    return Err(ExecutionError::UnhedgedLeg {
                        venue: long_venue,
                        symbol: long_leg.symbol.to_string(),
                    });
                }
                if !short_fill.fully_filled {
                    return Err(ExecutionError::UnhedgedLeg {
                        venue: short_venue,
                        symbol: short_leg.symbol.to_string(),
                    });
                }
                Ok(Some((long_fill, short_fill)))
            }
        }
    }
}
