use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute name -> opaque value. Schema-free.
pub type Record = Map<String, Value>;

/// Full mapping of entity name -> record
pub type World = BTreeMap<String, Record>;

/// Change event produced by every `set`/`update`
///
/// Carries the entity's full record after the mutation, never a delta.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub entity: String,
    pub record: Record,
}

impl ChangeEvent {
    pub fn new(entity: impl Into<String>, record: Record) -> Self {
        Self {
            entity: entity.into(),
            record,
        }
    }

    /// Wire form: `{"<entity>": <record>}`
    pub fn to_value(&self) -> Value {
        let mut obj = Map::with_capacity(1);
        obj.insert(self.entity.clone(), Value::Object(self.record.clone()));
        Value::Object(obj)
    }
}
