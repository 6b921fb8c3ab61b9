// World state: entity store, change notification, metrics

mod entity;
mod metrics;
mod notifier;
mod store;

pub use entity::{ChangeEvent, Record, World};
pub use metrics::{MetricsSnapshot, MetricsTracker};
pub use notifier::{ChangeNotifier, ChangeObserver};
pub use store::EntityStore;

#[cfg(test)]
mod tests;
