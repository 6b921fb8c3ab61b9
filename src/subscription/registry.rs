use crate::subscription::queue::{OutboundMessage, OutboundQueue, OverflowPolicy, PushOutcome};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One connected real-time peer and its pending messages
pub struct Subscriber {
    /// Registration sequence number; also the fan-out order
    id: u64,

    /// Correlates log lines for this connection
    session_id: Uuid,

    queue: OutboundQueue,

    alive: AtomicBool,
}

impl Subscriber {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    /// False once unregistered
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Next message for the peer; `None` once the subscriber is closed
    pub async fn next_message(&self) -> Option<OutboundMessage> {
        self.queue.next().await
    }
}

/// Tally of a single fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutStats {
    pub enqueued: u64,
    pub dropped: u64,
    pub overflowed: u64,
}

/// Live set of subscribers, in registration order
pub struct SubscriberRegistry {
    live: RwLock<Vec<Arc<Subscriber>>>,
    next_id: AtomicU64,
    queue_capacity: Option<usize>,
    overflow: OverflowPolicy,
    shutting_down: AtomicBool,
}

impl SubscriberRegistry {
    pub fn new(queue_capacity: Option<usize>, overflow: OverflowPolicy) -> Self {
        Self {
            live: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            queue_capacity,
            overflow,
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, OverflowPolicy::default())
    }

    /// Create a subscriber with an empty queue and add it to the live set
    pub fn register(&self) -> Arc<Subscriber> {
        let subscriber = Arc::new(Subscriber {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            session_id: Uuid::new_v4(),
            queue: OutboundQueue::with_limit(self.queue_capacity, self.overflow),
            alive: AtomicBool::new(true),
        });

        let mut live = self.live.write().expect("registry lock poisoned");
        if self.shutting_down.load(Ordering::Acquire) {
            // Still registered so the session unregisters it through the normal path
            subscriber.queue.close();
        }
        live.push(Arc::clone(&subscriber));

        info!(
            subscriber_id = subscriber.id,
            session_id = %subscriber.session_id,
            live = live.len(),
            "Subscriber registered"
        );
        subscriber
    }

    /// Remove from the live set and close its queue.
    ///
    /// Returns `false` if it was already gone; calling twice is harmless.
    pub fn unregister(&self, subscriber: &Subscriber) -> bool {
        let mut live = self.live.write().expect("registry lock poisoned");
        let before = live.len();
        live.retain(|s| s.id != subscriber.id);
        let removed = live.len() != before;

        subscriber.alive.store(false, Ordering::Release);
        subscriber.queue.close();

        if removed {
            info!(
                subscriber_id = subscriber.id,
                session_id = %subscriber.session_id,
                live = live.len(),
                "Subscriber unregistered"
            );
        } else {
            debug!(subscriber_id = subscriber.id, "Subscriber already unregistered");
        }
        removed
    }

    /// Enqueue `message` on every live subscriber, in registration order.
    ///
    /// Holds the read lock for the whole pass, so a concurrent `unregister`
    /// either happens entirely before or entirely after this fan-out.
    pub fn fan_out(&self, message: &OutboundMessage) -> FanoutStats {
        let live = self.live.read().expect("registry lock poisoned");
        let mut stats = FanoutStats::default();

        for subscriber in live.iter() {
            match subscriber.queue.push(Arc::clone(message)) {
                PushOutcome::Queued => stats.enqueued += 1,
                PushOutcome::DroppedOldest => {
                    stats.enqueued += 1;
                    stats.dropped += 1;
                }
                PushOutcome::Overflowed => {
                    stats.overflowed += 1;
                    warn!(
                        subscriber_id = subscriber.id,
                        session_id = %subscriber.session_id,
                        "Subscriber queue overflowed, disconnecting"
                    );
                }
                PushOutcome::Closed => {}
            }
        }

        stats
    }

    /// Close every queue; each session then winds down and unregisters
    pub fn shutdown(&self) {
        let live = self.live.read().expect("registry lock poisoned");
        self.shutting_down.store(true, Ordering::Release);
        for subscriber in live.iter() {
            subscriber.queue.close();
        }
        info!(live = live.len(), "Closing all subscriber queues");
    }

    pub fn len(&self) -> usize {
        self.live.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of live subscribers, in registration order
    pub fn ids(&self) -> Vec<u64> {
        self.live
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(|s| s.id)
            .collect()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::unbounded()
    }
}
