//! Desired-state documents and embedded task references
//!
//! A task's desired state is an ordered field document. References to other
//! tasks are embedded as single-entry objects under [`REF_KEY`]; the
//! dependency resolver discovers edges by walking this structure, and each
//! target renders reference nodes in its own notation.

use crate::task::TaskKey;
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which a task reference is embedded in a field value
pub const REF_KEY: &str = "#ref";

/// A task's desired state: field name to value, sorted for deterministic
/// serialization
pub type Fields = BTreeMap<String, Value>;

/// Encode a reference to another task as a field value
pub fn reference(key: &TaskKey) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(REF_KEY.to_string(), Value::String(key.to_string()));
    Value::Object(map)
}

/// Decode a field value as a task reference, if it is one
pub fn as_reference(value: &Value) -> Option<TaskKey> {
    let Value::Object(map) = value else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    match map.get(REF_KEY) {
        Some(Value::String(raw)) => TaskKey::parse(raw),
        _ => None,
    }
}

/// Recursively collect every task reference embedded in a value.
///
/// Sequences, nested objects, and optional fields (absent or embedded as
/// null) are walked; a reference itself is one hop and is never walked
/// through, so the walk always terminates.
pub fn collect_references(value: &Value, out: &mut Vec<TaskKey>) {
    if let Some(key) = as_reference(value) {
        out.push(key);
        return;
    }
    match value {
        Value::Object(map) => {
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

/// References embedded anywhere in a field document
pub fn document_references(fields: &Fields) -> Vec<TaskKey> {
    let mut out = Vec::new();
    for value in fields.values() {
        collect_references(value, &mut out);
    }
    out
}

/// Replace every reference node in a value, leaving the rest intact
pub fn map_references(value: &Value, render: &dyn Fn(&TaskKey) -> Value) -> Value {
    if let Some(key) = as_reference(value) {
        return render(&key);
    }
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, nested)| (name.clone(), map_references(nested, render)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| map_references(item, render)).collect())
        }
        other => other.clone(),
    }
}

/// Replace every reference node in a field document
pub fn map_document_references(fields: &Fields, render: &dyn Fn(&TaskKey) -> Value) -> Fields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), map_references(value, render)))
        .collect()
}

/// Builder for field documents
#[derive(Debug, Default)]
pub struct FieldsBuilder {
    fields: Fields,
}

impl FieldsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar or collection field
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Set a field referencing another task by key
    pub fn reference(mut self, name: &str, key: &TaskKey) -> Self {
        self.fields.insert(name.to_string(), reference(key));
        self
    }

    /// Set an optional field; `None` leaves the field unset
    pub fn optional<V: Into<Value>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.fields.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn build(self) -> Fields {
        self.fields
    }
}
