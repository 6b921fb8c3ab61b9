use crate::config::SubscriberConfig;
use crate::state::{EntityStore, MetricsTracker, World};
use crate::subscription::{Broadcaster, PeerChannel, Session, SubscriberRegistry};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Process-wide synchronization engine.
///
/// Built once at startup and shared by handle. Owns the world, the live
/// subscriber set and the broadcaster that links them.
pub struct SyncEngine {
    pub store: Arc<EntityStore>,
    pub registry: Arc<SubscriberRegistry>,
    pub metrics: MetricsTracker,
}

/// Point-in-time engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub entities: usize,
    pub subscribers: usize,
    #[serde(flatten)]
    pub metrics: crate::state::MetricsSnapshot,
}

impl SyncEngine {
    /// Wire store -> broadcaster -> registry
    pub fn new(config: &SubscriberConfig) -> Self {
        let store = Arc::new(EntityStore::new());
        let registry = Arc::new(SubscriberRegistry::new(
            config.queue_capacity,
            config.overflow,
        ));
        let metrics = MetricsTracker::new();

        store.add_observer(Arc::new(Broadcaster::new(
            Arc::clone(&registry),
            metrics.clone(),
        )));

        info!(
            queue_capacity = ?config.queue_capacity,
            overflow = ?config.overflow,
            "Sync engine initialized"
        );

        Self {
            store,
            registry,
            metrics,
        }
    }

    /// Build a session for a freshly accepted peer connection
    pub fn session<C: PeerChannel>(&self, channel: C) -> Session<C> {
        Session::new(channel, Arc::clone(&self.store), Arc::clone(&self.registry))
    }

    pub fn world(&self) -> World {
        self.store.snapshot()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            entities: self.store.len(),
            subscribers: self.registry.len(),
            metrics: self.metrics.get_snapshot(),
        }
    }

    /// Close every subscriber; their sessions end with `CloseReason::Shutdown`
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(&SubscriberConfig::default())
    }
}
