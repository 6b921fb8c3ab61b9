// Real-time subscribers: queues, registry, fan-out and per-connection sessions

pub mod broadcaster;
pub mod channel;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod session;

pub use broadcaster::Broadcaster;
pub use channel::{MemoryChannel, MemoryPeer, PeerChannel};
pub use queue::{OutboundMessage, OutboundQueue, OverflowPolicy, PushOutcome};
pub use registry::{FanoutStats, Subscriber, SubscriberRegistry};
pub use session::{CloseReason, Session, SessionState};
