//! Insertion-ordered key/value storage with per-entry enumerability.
//!
//! A `Record` is the "plain structure" of the merge engine: a bare mapping
//! from property keys to values, with no class identity. Entries remember
//! insertion order and carry an enumerable flag, so enumeration-based
//! operations (merging, JSON conversion, equality) can skip hidden entries
//! while plain reads still see them.

use super::{Key, Value};

/// A single slot in a record.
#[derive(Clone, Debug)]
struct Entry {
    key: Key,
    value: Value,
    enumerable: bool,
}

/// A plain key/value record.
///
/// Keys are either strings or symbols (see [`Key`]). Entries preserve
/// insertion order. Enumeration yields string keys before symbol keys,
/// each group in insertion order, and only includes enumerable entries.
#[derive(Clone, Debug, Default)]
pub struct Record {
    entries: Vec<Entry>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Read the value at `key`, enumerable or not.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == *key)
            .map(|entry| entry.value.clone())
    }

    /// Assign `value` at `key`.
    ///
    /// An existing entry keeps its position and its enumerable flag; a new
    /// entry is appended and is enumerable.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                key,
                value,
                enumerable: true,
            }),
        }
    }

    /// Create or overwrite the entry at `key` with an explicit enumerable
    /// flag. Non-enumerable entries are readable but never merged, compared,
    /// or converted.
    pub fn define(&mut self, key: impl Into<Key>, value: impl Into<Value>, enumerable: bool) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => {
                entry.value = value;
                entry.enumerable = enumerable;
            }
            None => self.entries.push(Entry {
                key,
                value,
                enumerable,
            }),
        }
    }

    /// Remove the entry at `key`, returning its value.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        let index = self.entries.iter().position(|entry| entry.key == *key)?;
        Some(self.entries.remove(index).value)
    }

    /// Whether an entry exists at `key`, enumerable or not.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.iter().any(|entry| entry.key == *key)
    }

    /// Total number of entries, including non-enumerable ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enumerable own keys: string keys first, then symbol keys, each in
    /// insertion order.
    pub fn own_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .entries
            .iter()
            .filter(|entry| entry.enumerable && matches!(entry.key, Key::Str(_)))
            .map(|entry| entry.key.clone())
            .collect();
        keys.extend(
            self.entries
                .iter()
                .filter(|entry| entry.enumerable && matches!(entry.key, Key::Sym(_)))
                .map(|entry| entry.key.clone()),
        );
        keys
    }

    /// Snapshot of the enumerable entries, in [`Record::own_keys`] order.
    pub fn enumerable_entries(&self) -> Vec<(Key, Value)> {
        self.own_keys()
            .into_iter()
            .map(|key| {
                let value = self
                    .get(&key)
                    .unwrap_or(Value::Null);
                (key, value)
            })
            .collect()
    }

    /// Read the value at `key` only if the entry is enumerable.
    pub fn get_enumerable(&self, key: &Key) -> Option<Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == *key && entry.enumerable)
            .map(|entry| entry.value.clone())
    }
}
