//! WebSocket clients for Bybit's public market stream, private stream, and
//! trade stream (spec.md §4.3). Each is a singleton per symbol/session — no
//! parallel sessions for the same channel (spec.md §5 bounded concurrency).

pub mod backoff;
pub mod market_state;
pub mod private_stream;
pub mod public_stream;
pub mod timeout;
pub mod trade_stream;

pub use backoff::ReconnectBackoff;
pub use market_state::MarketState;
pub use private_stream::{BybitPrivateStream, OrderFinal};
pub use public_stream::BybitPublicStream;
pub use trade_stream::BybitTradeStream;
