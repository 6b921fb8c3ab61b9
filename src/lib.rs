// Configuration (TOML file + environment)
pub mod config;

// Entity store, change notification, metrics
pub mod state;

// Subscriber queues, registry, fan-out and sessions
pub mod subscription;

// Wiring of store and subscribers
pub mod engine;

// HTTP and WebSocket APIs
pub mod api;

pub use engine::{EngineStats, SyncEngine};
