use crate::Message;
use thiserror::Error;
use tokio::sync::mpsc;

/// The outbound sink for routed messages.
///
/// Implementations must not block the caller; delivery is best-effort and
/// failures are surfaced as an error for the caller to log and discard.
pub trait MessageLayer: Send + Sync + 'static {
    fn send(&self, message: Message) -> Result<(), SendError>;
}

#[derive(Debug, Error)]
#[error("message transport closed")]
pub struct SendError;

/// A message layer that forwards envelopes into an in-process channel.
///
/// The receiving half is consumed by the transport bridge; if it goes away
/// every subsequent send fails without blocking.
pub struct ChannelMessageLayer {
    tx: mpsc::UnboundedSender<Message>,
}

/// Creates a channel-backed message layer and the receiver feeding the
/// transport.
pub fn channel() -> (ChannelMessageLayer, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelMessageLayer { tx }, rx)
}

impl MessageLayer for ChannelMessageLayer {
    fn send(&self, message: Message) -> Result<(), SendError> {
        self.tx.send(message).map_err(|_| SendError)
    }
}
