use crate::venue::VenueId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy shared across the venue adapter layer, news engine and
/// execution engine (spec.md §7). These are *kinds*, not one type per venue:
/// every adapter maps its own error codes onto this enum so callers reason
/// about behaviour uniformly instead of per-venue quirks.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum VenueError {
    #[error("{venue}: transient network error: {message}")]
    TransientNetwork { venue: VenueId, message: String },

    #[error("{venue}: rate limited")]
    RateLimited { venue: VenueId },

    #[error("{venue}: blocked by WAF/challenge")]
    WafBlocked { venue: VenueId },

    #[error("{venue}: protocol error: {message}")]
    ProtocolError { venue: VenueId, message: String },

    #[error("{venue}: auth error: {message}")]
    AuthError { venue: VenueId, message: String },

    #[error("{venue}: order {order_id:?} not fully filled within window")]
    FillFailure {
        venue: VenueId,
        order_id: Option<String>,
    },

    #[error("missing configuration: {message}")]
    ConfigError { message: String },
}

impl VenueError {
    pub fn venue(&self) -> Option<VenueId> {
        match self {
            VenueError::TransientNetwork { venue, .. }
            | VenueError::RateLimited { venue }
            | VenueError::WafBlocked { venue }
            | VenueError::ProtocolError { venue, .. }
            | VenueError::AuthError { venue, .. }
            | VenueError::FillFailure { venue, .. } => Some(*venue),
            VenueError::ConfigError { .. } => None,
        }
    }

    /// `AuthError`/`ConfigError`/`FillFailure` are fatal for the calling
    /// operation and must not be retried or silently swallowed, unlike
    /// `TransientNetwork`/`RateLimited`/`WafBlocked`/`ProtocolError` which the
    /// scanner degrades gracefully around (spec.md §7 propagation policy).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VenueError::AuthError { .. }
                | VenueError::ConfigError { .. }
                | VenueError::FillFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification_matches_propagation_policy() {
        assert!(VenueError::AuthError {
            venue: VenueId::Bybit,
            message: "bad sig".into()
        }
        .is_fatal());
        assert!(!VenueError::RateLimited {
            venue: VenueId::Bybit
        }
        .is_fatal());
        assert!(!VenueError::TransientNetwork {
            venue: VenueId::Bybit,
            message: "timeout".into()
        }
        .is_fatal());
    }
}
