use crate::state::EntityStore;
use crate::subscription::channel::PeerChannel;
use crate::subscription::protocol::{decode_update, encode_snapshot};
use crate::subscription::registry::{Subscriber, SubscriberRegistry};
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle of one subscriber connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the connection or stopped sending
    PeerClosed,
    /// Transmitting to the peer failed
    SendFailed,
    /// Peer sent something that is not `{entity: {attr: value}}`
    MalformedMessage,
    /// Outbound queue hit its bound under the disconnect policy
    Overflow,
    /// Server is shutting down
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::PeerClosed => "peer closed",
            CloseReason::SendFailed => "send failed",
            CloseReason::MalformedMessage => "malformed message",
            CloseReason::Overflow => "queue overflow",
            CloseReason::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// Drives one peer connection from connect to close.
///
/// While active, two duties share the task:
/// - delivery: drain the subscriber queue to the peer
/// - ingestion: apply peer messages to the store with `set`
///
/// Both run under one `select!`, so when either ends the other stops with it.
pub struct Session<C> {
    channel: C,
    store: Arc<EntityStore>,
    registry: Arc<SubscriberRegistry>,
    state: SessionState,
    session_id: Option<Uuid>,
}

impl<C: PeerChannel> Session<C> {
    pub fn new(channel: C, store: Arc<EntityStore>, registry: Arc<SubscriberRegistry>) -> Self {
        Self {
            channel,
            store,
            registry,
            state: SessionState::Connecting,
            session_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run to completion. Always unregisters exactly once before returning.
    pub async fn run(mut self) -> CloseReason {
        // Register and snapshot under the store's commit lock: every change
        // after this snapshot lands in the new queue, none before it do.
        let registry = Arc::clone(&self.registry);
        let (subscriber, snapshot) = self.store.with_snapshot(|world| {
            let subscriber = registry.register();
            let snapshot = (!world.is_empty()).then(|| encode_snapshot(world));
            (subscriber, snapshot)
        });
        self.session_id = Some(subscriber.session_id());
        self.transition(SessionState::Active);

        let reason = self.drive(&subscriber, snapshot).await;

        self.transition(SessionState::Closing);
        self.registry.unregister(&subscriber);
        self.channel.close().await;
        self.transition(SessionState::Closed);

        info!(
            session_id = %subscriber.session_id(),
            reason = %reason,
            "Subscriber session closed"
        );
        reason
    }

    async fn drive(
        &mut self,
        subscriber: &Subscriber,
        snapshot: Option<Result<String>>,
    ) -> CloseReason {
        match snapshot {
            Some(Ok(world)) => {
                if let Err(e) = self.channel.send(&world).await {
                    debug!(error = %e, "Failed to send initial snapshot");
                    return CloseReason::SendFailed;
                }
            }
            Some(Err(e)) => {
                error!(error = %e, "Failed to encode initial snapshot");
            }
            None => {}
        }

        loop {
            tokio::select! {
                inbound = self.channel.receive() => {
                    match inbound {
                        Some(text) => {
                            if let Err(e) = self.ingest(&text) {
                                warn!(
                                    session_id = %subscriber.session_id(),
                                    error = %e,
                                    "Malformed message from subscriber"
                                );
                                return CloseReason::MalformedMessage;
                            }
                        }
                        None => return CloseReason::PeerClosed,
                    }
                }

                outbound = subscriber.next_message() => {
                    match outbound {
                        Some(message) => {
                            if let Err(e) = self.channel.send(&message).await {
                                debug!(error = %e, "Failed to deliver message");
                                return CloseReason::SendFailed;
                            }
                        }
                        None if subscriber.queue().overflowed() => return CloseReason::Overflow,
                        None => return CloseReason::Shutdown,
                    }
                }
            }
        }
    }

    /// Apply one peer message; each entity replaces its record and echoes
    /// back to every subscriber, this one included.
    fn ingest(&self, text: &str) -> Result<()> {
        let update = decode_update(text)?;
        debug!(entities = update.len(), "Applying subscriber update");

        for (entity, record) in update {
            self.store.set(&entity, record);
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            session_id = ?self.session_id,
            from = ?self.state,
            to = ?next,
            "Session state change"
        );
        self.state = next;
    }
}
