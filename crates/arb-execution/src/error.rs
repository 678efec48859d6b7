use arb_core::{VenueError, VenueId};
use thiserror::Error;

/// Execution-path error taxonomy (spec.md §7): unlike the scanner, the
/// Execution Engine fails fast — any of these aborts the paired trade.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("missing credentials for {venue}")]
    MissingCredentials { venue: VenueId },

    #[error("{venue}: preflight failed for {symbol}: {reason}")]
    PreflightFailed {
        venue: VenueId,
        symbol: String,
        reason: String,
    },

    #[error("{venue}: failed to set isolated margin / leverage=1 for {symbol}: {reason}")]
    MarginSetupFailed {
        venue: VenueId,
        symbol: String,
        reason: String,
    },

    #[error("{venue}: order placement rejected: {reason}")]
    PlacementRejected { venue: VenueId, reason: String },

    #[error("{venue}: order {order_id} not fully filled within window (filled {filled}/{requested})")]
    FillFailure {
        venue: VenueId,
        order_id: String,
        filled: String,
        requested: String,
    },

    /// One leg filled, the other did not — the filled leg is an unhedged
    /// risk that must be surfaced loudly, not silently retried (spec.md
    /// §4.7.3, §7 `FillFailure` propagation policy).
    #[error("unhedged leg: {venue} {symbol} filled but the opposite leg did not")]
    UnhedgedLeg { venue: VenueId, symbol: String },

    #[error(transparent)]
    Venue(#[from] VenueError),

    #[error("{0}")]
    Transport(String),
}
