use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the synchronization engine
#[derive(Clone)]
pub struct MetricsTracker {
    /// Change events fanned out (lifetime counter)
    events_total: Arc<AtomicU64>,

    /// Messages placed on subscriber queues
    messages_enqueued: Arc<AtomicU64>,

    /// Messages discarded by a full queue
    messages_dropped: Arc<AtomicU64>,

    /// WebSocket connection count
    websocket_connections: Arc<AtomicU64>,

    started_at: DateTime<Utc>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            events_total: Arc::new(AtomicU64::new(0)),
            messages_enqueued: Arc::new(AtomicU64::new(0)),
            messages_dropped: Arc::new(AtomicU64::new(0)),
            websocket_connections: Arc::new(AtomicU64::new(0)),
            started_at: Utc::now(),
        }
    }

    /// Record one fan-out: `enqueued` messages delivered to queues, `dropped` evicted
    pub fn record_fanout(&self, enqueued: u64, dropped: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.messages_enqueued.fetch_add(enqueued, Ordering::Relaxed);
        if dropped > 0 {
            self.messages_dropped.fetch_add(dropped, Ordering::Relaxed);
        }
    }

    pub fn increment_ws_connection(&self) {
        self.websocket_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_ws_connection(&self) {
        self.websocket_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get_ws_connection_count(&self) -> u64 {
        self.websocket_connections.load(Ordering::Relaxed)
    }

    pub fn get_total_events(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_total: self.get_total_events(),
            messages_enqueued: self.messages_enqueued.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            websocket_connections: self.get_ws_connection_count(),
            started_at: self.started_at,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub events_total: u64,
    pub messages_enqueued: u64,
    pub messages_dropped: u64,
    pub websocket_connections: u64,
    pub started_at: DateTime<Utc>,
}
