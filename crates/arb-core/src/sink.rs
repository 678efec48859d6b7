use async_trait::async_trait;

/// External notification surface (spec.md §6.5). The core never formats
/// transport-specific payloads (Telegram markup, etc); it passes structured
/// opportunity records to the scanner/execution layers, which render them
/// into plain text/images before calling a `Sink`. Implementations are
/// owned and wired by `arb-app` (spec.md §9 "process-wide sinks... passed
/// as dependencies, not globals").
#[async_trait]
pub trait Sink: Send + Sync {
    async fn emit_message(&self, channel: &str, text: &str);

    async fn emit_image(&self, channel: &str, image_bytes: Vec<u8>, caption: &str);
}
