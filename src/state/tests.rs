use super::*;
use anyhow::Result;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::thread;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

/// Collects every change event the store fires
fn recording_store() -> (EntityStore, Arc<Mutex<Vec<ChangeEvent>>>) {
    let store = EntityStore::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.add_observer(Arc::new(move |e: &ChangeEvent| -> Result<()> {
        sink.lock().unwrap().push(e.clone());
        Ok(())
    }));
    (store, events)
}

#[test]
fn test_get_nonexistent_entity_is_empty() {
    let store = EntityStore::new();
    assert_eq!(store.get("nonexistent"), Map::new());
}

#[test]
fn test_set_then_update_merges() {
    let (store, events) = recording_store();

    store.set("a", record(json!({"x": 1})));
    let merged = store.update("a", "y", json!(2));

    assert_eq!(merged, record(json!({"x": 1, "y": 2})));
    assert_eq!(store.get("a"), record(json!({"x": 1, "y": 2})));

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ChangeEvent::new("a", record(json!({"x": 1}))));
    assert_eq!(events[1], ChangeEvent::new("a", record(json!({"x": 1, "y": 2}))));
}

#[test]
fn test_set_replaces_whole_record() {
    let store = EntityStore::new();

    store.update("a", "x", json!(1));
    store.update("a", "y", json!(2));
    store.set("a", record(json!({"z": 3})));

    assert_eq!(store.get("a"), record(json!({"z": 3})));
}

#[test]
fn test_set_empty_record_fires_event() {
    let (store, events) = recording_store();

    store.set("a", Map::new());

    assert_eq!(store.snapshot().get("a"), Some(&Map::new()));
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn test_update_creates_entity() {
    let store = EntityStore::new();

    let rec = store.update("sensor_42", "temperature", json!(22.5));

    assert_eq!(rec, record(json!({"temperature": 22.5})));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_nested_values_are_opaque() {
    let store = EntityStore::new();
    let value = json!({"colour": "red", "points": [[1, 2], [3, 4]], "visible": true});

    store.update("shape", "style", value.clone());

    assert_eq!(store.get("shape")["style"], value);
}

#[test]
fn test_clear_empties_world_without_events() {
    let (store, events) = recording_store();

    store.set("a", record(json!({"x": 1})));
    store.update("b", "y", json!(2));
    events.lock().unwrap().clear();

    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.get("a"), Map::new());
    assert_eq!(store.get("b"), Map::new());
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn test_update_after_clear_starts_fresh() {
    let store = EntityStore::new();

    store.set("a", record(json!({"x": 1})));
    store.clear();
    store.update("a", "y", json!(2));

    assert_eq!(store.get("a"), record(json!({"y": 2})));
}

#[test]
fn test_snapshot_returns_full_world() {
    let store = EntityStore::new();

    store.set("a", record(json!({"x": 1})));
    store.set("b", record(json!({"y": 2})));

    let world = store.snapshot();
    assert_eq!(world.len(), 2);
    assert_eq!(world["a"], record(json!({"x": 1})));
    assert_eq!(world["b"], record(json!({"y": 2})));
}

#[test]
fn test_observer_sees_committed_value() {
    let store = Arc::new(EntityStore::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let store_ref = Arc::downgrade(&store);
    let sink = Arc::clone(&seen);
    store.add_observer(Arc::new(move |e: &ChangeEvent| -> Result<()> {
        if let Some(store) = store_ref.upgrade() {
            sink.lock().unwrap().push(store.get(&e.entity));
        }
        Ok(())
    }));

    store.set("a", record(json!({"x": 1})));
    store.update("a", "y", json!(2));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            record(json!({"x": 1})),
            record(json!({"x": 1, "y": 2}))
        ]
    );
}

#[test]
fn test_failing_observer_does_not_fail_mutation() {
    let store = EntityStore::new();
    store.add_observer(Arc::new(|_: &ChangeEvent| -> Result<()> {
        anyhow::bail!("observer unavailable")
    }));

    let rec = store.update("a", "x", json!(1));

    assert_eq!(rec, record(json!({"x": 1})));
    assert_eq!(store.get("a"), rec);
}

#[test]
fn test_concurrent_updates_same_entity() {
    let store = Arc::new(EntityStore::new());
    let mut handles = vec![];

    // All threads merge distinct attributes into one entity
    for i in 0..10 {
        let store_clone = Arc::clone(&store);
        let handle = thread::spawn(move || {
            let key = format!("prop_{}", i);
            store_clone.update("shared_entity", &key, json!(i));
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get("shared_entity").len(), 10);
}

#[test]
fn test_concurrent_events_reflect_commit_order() {
    let (store, events) = recording_store();
    let store = Arc::new(store);
    let mut handles = vec![];

    for t in 0..4 {
        let store_clone = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                store_clone.update("counter", &format!("t{}", t), json!(i));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 200);

    // Each event is the full record at its commit; attribute counts never shrink
    let sizes: Vec<usize> = events.iter().map(|e| e.record.len()).collect();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(events.last().unwrap().record, store.get("counter"));
}

#[test]
fn test_with_snapshot_holds_off_mutations() {
    let store = Arc::new(EntityStore::new());
    store.set("a", record(json!({"x": 1})));

    let seen = store.with_snapshot(|world| world.clone());

    assert_eq!(seen, store.snapshot());
}
