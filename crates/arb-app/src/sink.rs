//! `Sink` wiring (spec.md §6.5, §9): the core only depends on the
//! `emitMessage`/`emitImage` trait; Telegram formatting and image rendering
//! are explicitly out of scope. This crate's own implementation just routes
//! through `tracing`, matching how the rest of the workspace avoids
//! `println!`/`eprintln!` — a real transport-specific sink is a separate
//! binary concern that plugs into the same trait.

use arb_core::Sink;
use async_trait::async_trait;
use tracing::info;

/// Logs every emission at info level instead of delivering it anywhere.
/// Useful standalone and as the default when no transport-specific sink is
/// configured.
pub struct LoggingSink;

#[async_trait]
impl Sink for LoggingSink {
    async fn emit_message(&self, channel: &str, text: &str) {
        info!(channel, text, "sink: message");
    }

    async fn emit_image(&self, channel: &str, image_bytes: Vec<u8>, caption: &str) {
        info!(channel, caption, bytes = image_bytes.len(), "sink: image");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_sink_does_not_panic() {
        let sink = LoggingSink;
        sink.emit_message("ops", "hello").await;
        sink.emit_image("ops", vec![1, 2, 3], "caption").await;
    }
}
