use async_trait::async_trait;

use crate::error::Result;

/// Write side of one accepted socket.
///
/// Adapters implement this once per transport technology. Inbound signals
/// are not part of the trait: the adapter reads its own socket and calls the
/// matching `ConnectionHandler::on_*` method.
#[async_trait]
pub trait Transport: Send {
    /// Queue one text frame for delivery. Errors once the peer is gone.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Begin a server-initiated close.
    async fn close(&mut self) -> Result<()>;
}
