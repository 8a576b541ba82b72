use async_trait::async_trait;
use konekt_core::ClientMessage;

/// Outbound half of the signaling channel. The session never addresses
/// its room mate directly; routing is the signaling server's job.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, msg: ClientMessage) -> anyhow::Result<()>;
}
