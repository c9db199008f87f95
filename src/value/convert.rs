//! JSON boundary for the dynamic value model.
//!
//! This is where external data enters and leaves the system. Incoming
//! `serde_json::Value` trees become freshly allocated [`Value`] graphs;
//! outgoing conversion walks the graph and fails on anything JSON cannot
//! represent (reference cycles, opaque values). Symbol keys and
//! non-enumerable entries are silently skipped on the way out, the way
//! `JSON.stringify` drops them.

use std::collections::HashSet;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, Serializer};

use crate::error::ConvertError;

use super::{Key, Value};

impl Value {
    /// Shape a JSON tree into a value graph. Every array and record in the
    /// result is freshly allocated.
    pub fn from_json(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    /// Render the value graph as JSON.
    ///
    /// Symbol keys and non-enumerable entries are dropped. Fails on
    /// reference cycles and opaque values; shared (acyclic) substructures
    /// are duplicated in the output.
    pub fn to_json(&self) -> Result<serde_json::Value, ConvertError> {
        let mut in_progress = HashSet::new();
        to_json_inner(self, &mut in_progress)
    }
}

fn to_json_inner(
    value: &Value,
    in_progress: &mut HashSet<usize>,
) -> Result<serde_json::Value, ConvertError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => Ok(serde_json::Value::Number(n.clone())),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Array(items) => {
            let addr = value.heap_addr().unwrap_or_default();
            if !in_progress.insert(addr) {
                return Err(ConvertError::CyclicValue);
            }
            let mut out = Vec::with_capacity(items.borrow().len());
            let snapshot: Vec<Value> = items.borrow().clone();
            for item in &snapshot {
                out.push(to_json_inner(item, in_progress)?);
            }
            in_progress.remove(&addr);
            Ok(serde_json::Value::Array(out))
        }
        Value::Record(record) => {
            let addr = value.heap_addr().unwrap_or_default();
            if !in_progress.insert(addr) {
                return Err(ConvertError::CyclicValue);
            }
            let entries = record.borrow().enumerable_entries();
            let mut out = serde_json::Map::new();
            for (key, entry) in &entries {
                // Symbol keys have no JSON spelling.
                if let Key::Str(name) = key {
                    out.insert(name.clone(), to_json_inner(entry, in_progress)?);
                }
            }
            in_progress.remove(&addr);
            Ok(serde_json::Value::Object(out))
        }
        Value::Opaque(_) => Err(ConvertError::OpaqueValue),
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let record = Value::record();
                for (key, entry) in map {
                    record.insert(key, Value::from(entry));
                }
                record
            }
        }
    }
}

impl TryFrom<&Value> for serde_json::Value {
    type Error = ConvertError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
