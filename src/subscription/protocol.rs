//! Wire format shared by both directions of a subscriber connection.
//!
//! Every message is a JSON object keyed by entity name:
//!
//! ```json
//! {"ball": {"x": 10, "y": 20, "colour": "red"}}
//! ```
//!
//! Server -> client messages carry full records. The initial snapshot uses
//! the same shape with one key per known entity.

use crate::state::{ChangeEvent, Record, World};
use crate::subscription::queue::OutboundMessage;
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;

/// Client -> server: entity name -> record, applied with full-replace semantics
pub type InboundUpdate = Vec<(String, Record)>;

/// Serialize a change event once for fan-out
pub fn encode_event(event: &ChangeEvent) -> Result<OutboundMessage> {
    let json = serde_json::to_string(&event.to_value()).context("Failed to encode change event")?;
    Ok(Arc::from(json))
}

/// Serialize the full world for a newly connected subscriber
pub fn encode_snapshot(world: &World) -> Result<String> {
    serde_json::to_string(world).context("Failed to encode world snapshot")
}

/// Parse a client message. Every value must itself be a JSON object.
pub fn decode_update(text: &str) -> Result<InboundUpdate> {
    let value: Value = serde_json::from_str(text).context("Message is not valid JSON")?;

    let Value::Object(entities) = value else {
        anyhow::bail!("Message must be a JSON object keyed by entity name");
    };

    entities
        .into_iter()
        .map(|(entity, record)| match record {
            Value::Object(record) => Ok((entity, record)),
            other => Err(anyhow::anyhow!(
                "Entity '{}' must map to an object, got {}",
                entity,
                json_type(&other)
            )),
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
