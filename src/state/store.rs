use crate::state::entity::{ChangeEvent, Record, World};
use crate::state::notifier::{ChangeNotifier, ChangeObserver};
use serde_json::Value;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Authoritative in-memory world state
///
/// Mutations are serialized through `commit`, which is held across both the
/// write and the observer notification. Every observer therefore sees change
/// events in one total order, and a `get` issued from inside an observer
/// already returns the new value.
pub struct EntityStore {
    /// Entity name -> record
    world: RwLock<World>,

    /// Single-mutator lock; covers mutation plus notification
    commit: Mutex<()>,

    notifier: ChangeNotifier,
}

impl EntityStore {
    /// Create an empty store with no observers
    pub fn new() -> Self {
        Self {
            world: RwLock::new(World::new()),
            commit: Mutex::new(()),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn ChangeObserver>) {
        self.notifier.add_observer(observer);
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Current record for `entity`, empty if absent
    pub fn get(&self, entity: &str) -> Record {
        self.read_world().get(entity).cloned().unwrap_or_default()
    }

    /// Replace the whole record for `entity`. Fires one change event.
    pub fn set(&self, entity: &str, record: Record) -> Record {
        self.commit(entity, |world| {
            world.insert(entity.to_string(), record.clone());
            record
        })
    }

    /// Merge one attribute into `entity`, creating it if absent. Fires one change event.
    pub fn update(&self, entity: &str, key: &str, value: Value) -> Record {
        self.commit(entity, |world| {
            let record = world.entry(entity.to_string()).or_default();
            record.insert(key.to_string(), value);
            record.clone()
        })
    }

    /// Drop every entity. No change events are fired.
    pub fn clear(&self) {
        let _guard = self.commit.lock().expect("commit lock poisoned");
        let mut world = self.write_world();
        let removed = world.len();
        world.clear();
        info!(removed = removed, "World cleared");
    }

    /// Copy of the full world
    pub fn snapshot(&self) -> World {
        self.read_world().clone()
    }

    /// Run `f` against the current world with mutations held off.
    ///
    /// Anything `f` registers as an observer target is guaranteed to see
    /// exactly the change events committed after the world it was handed.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        let _guard = self.commit.lock().expect("commit lock poisoned");
        let world = self.read_world();
        f(&world)
    }

    pub fn len(&self) -> usize {
        self.read_world().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_world().is_empty()
    }

    fn commit(&self, entity: &str, mutate: impl FnOnce(&mut World) -> Record) -> Record {
        let _guard = self.commit.lock().expect("commit lock poisoned");

        let record = {
            let mut world = self.write_world();
            mutate(&mut world)
        };
        debug!(entity = %entity, attributes = record.len(), "Entity committed");

        let event = ChangeEvent::new(entity, record);
        self.notifier.notify(&event);
        event.record
    }

    fn read_world(&self) -> std::sync::RwLockReadGuard<'_, World> {
        self.world.read().expect("world lock poisoned")
    }

    fn write_world(&self) -> std::sync::RwLockWriteGuard<'_, World> {
        self.world.write().expect("world lock poisoned")
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
