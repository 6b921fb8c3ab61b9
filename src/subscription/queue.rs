use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Serialized wire message, shared by every queue it is pushed onto
pub type OutboundMessage = Arc<str>;

/// What a bounded queue does when a push finds it full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest pending message to make room
    #[default]
    DropOldest,
    /// Close the queue; the owning session disconnects
    Disconnect,
}

/// Result of a single push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting the oldest message
    DroppedOldest,
    /// Queue was full and has been closed
    Overflowed,
    /// Queue was already closed; message discarded
    Closed,
}

struct QueueState {
    messages: VecDeque<OutboundMessage>,
    closed: bool,
    overflowed: bool,
}

/// FIFO of pending messages for one subscriber
///
/// Producers never wait. A single consumer (the session's delivery duty)
/// suspends in `next` while the queue is empty.
pub struct OutboundQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: Option<usize>,
    policy: OverflowPolicy,
}

impl OutboundQueue {
    pub fn unbounded() -> Self {
        Self::with_limit(None, OverflowPolicy::default())
    }

    pub fn with_limit(capacity: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState {
                messages: VecDeque::new(),
                closed: false,
                overflowed: false,
            }),
            notify: Notify::new(),
            // A zero bound would reject everything; treat it as one slot
            capacity: capacity.map(|c| c.max(1)),
            policy,
        }
    }

    pub fn push(&self, message: OutboundMessage) -> PushOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return PushOutcome::Closed;
            }

            let full = self
                .capacity
                .is_some_and(|cap| state.messages.len() >= cap);

            if !full {
                state.messages.push_back(message);
                PushOutcome::Queued
            } else {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        state.messages.pop_front();
                        state.messages.push_back(message);
                        PushOutcome::DroppedOldest
                    }
                    OverflowPolicy::Disconnect => {
                        state.closed = true;
                        state.overflowed = true;
                        state.messages.clear();
                        PushOutcome::Overflowed
                    }
                }
            }
        };

        self.notify.notify_one();
        outcome
    }

    /// Next pending message, or `None` once the queue is closed.
    ///
    /// Cancel safe: a message is only removed when this future completes.
    pub async fn next(&self) -> Option<OutboundMessage> {
        loop {
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(message) = state.messages.pop_front() {
                    return Some(message);
                }
            }
            self.notify.notified().await;
        }
    }

    /// Close the queue and discard anything pending. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.messages.clear();
        }
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// True if the queue was closed because a push found it full
    pub fn overflowed(&self) -> bool {
        self.lock().overflowed
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().expect("outbound queue lock poisoned")
    }
}
