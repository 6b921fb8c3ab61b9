use anyhow::{anyhow, Result};
use std::future::Future;
use tokio::sync::mpsc;

/// Bidirectional text channel to one real-time peer.
///
/// The session only sees serialized messages; framing, handshakes and
/// keep-alives belong to the transport behind this trait.
pub trait PeerChannel: Send {
    /// Transmit one message. An error means the peer is gone.
    fn send(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send;

    /// Next message from the peer, or `None` once it has closed.
    ///
    /// Must be cancel safe: the session races it against outbound delivery.
    fn receive(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Release the connection. Best effort.
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// In-process channel, used by tests and for embedding the engine
pub struct MemoryChannel {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

/// The remote end of a [`MemoryChannel`]
pub struct MemoryPeer {
    to_server: Option<mpsc::UnboundedSender<String>>,
    from_server: mpsc::UnboundedReceiver<String>,
}

impl MemoryChannel {
    pub fn pair() -> (MemoryChannel, MemoryPeer) {
        let (to_server, inbound) = mpsc::unbounded_channel();
        let (outbound, from_server) = mpsc::unbounded_channel();
        (
            MemoryChannel { inbound, outbound },
            MemoryPeer {
                to_server: Some(to_server),
                from_server,
            },
        )
    }
}

impl PeerChannel for MemoryChannel {
    async fn send(&mut self, message: &str) -> Result<()> {
        self.outbound
            .send(message.to_string())
            .map_err(|_| anyhow!("peer disconnected"))
    }

    async fn receive(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

impl MemoryPeer {
    /// Send a message to the server side. Returns `false` once it has closed.
    pub fn send(&self, message: impl Into<String>) -> bool {
        match &self.to_server {
            Some(tx) => tx.send(message.into()).is_ok(),
            None => false,
        }
    }

    /// Next message from the server, `None` once the session has ended
    pub async fn recv(&mut self) -> Option<String> {
        self.from_server.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.from_server.try_recv().ok()
    }

    /// Stop sending; the session sees the peer as closed
    pub fn close_input(&mut self) {
        self.to_server = None;
    }
}
