use crate::state::{ChangeEvent, ChangeObserver, MetricsTracker};
use crate::subscription::protocol::encode_event;
use crate::subscription::registry::{FanoutStats, SubscriberRegistry};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Turns change events into queued network messages.
///
/// Installed as the store's only observer; this is the single place where
/// world mutations become subscriber traffic.
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    metrics: MetricsTracker,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>, metrics: MetricsTracker) -> Self {
        Self { registry, metrics }
    }

    /// Serialize `event` once and enqueue it on every live subscriber
    pub fn broadcast(&self, event: &ChangeEvent) -> Result<FanoutStats> {
        let message = encode_event(event)?;
        let stats = self.registry.fan_out(&message);

        self.metrics.record_fanout(stats.enqueued, stats.dropped);
        debug!(
            entity = %event.entity,
            enqueued = stats.enqueued,
            dropped = stats.dropped,
            "Change event fanned out"
        );
        Ok(stats)
    }
}

impl ChangeObserver for Broadcaster {
    fn on_change(&self, event: &ChangeEvent) -> Result<()> {
        self.broadcast(event).map(|_| ())
    }
}
