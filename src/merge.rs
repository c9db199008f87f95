//! Recursive deep merge with customizer hooks and cycle handling.
//!
//! [`merge`] combines one or more source records into a destination record,
//! in place, left-to-right. Plain records merge recursively; everything
//! else (arrays, opaque values, primitives) is assigned by replacement,
//! sharing the source's storage. A per-call [`Visited`] map defuses
//! reference cycles in sources and preserves shared-substructure topology.
//!
//! [`merge_with`] additionally consults a caller-supplied customizer per
//! key; an explicit [`MergeDecision::Assign`] wins over the default policy,
//! even for null or otherwise falsy values.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::value::{Key, Record, Value};

/// The customizer's verdict for a single key.
///
/// An explicit variant rather than a sentinel value, so a customizer can
/// legitimately assign `Value::Null` (or any other value) while still being
/// able to say "use the default policy".
#[derive(Clone, Debug, PartialEq)]
pub enum MergeDecision {
    /// Fall through to the engine's default policy.
    Defer,
    /// Assign this value at the key and stop processing it.
    Assign(Value),
}

/// Everything a customizer gets to see for one key.
pub struct MergeSite<'a> {
    /// Current value on the destination at `key`, if any.
    pub dest_value: Option<&'a Value>,
    /// Incoming value from the current source at `key`.
    pub src_value: &'a Value,
    /// The key being merged.
    pub key: &'a Key,
    /// The destination record being merged into, at this nesting level.
    pub dest: &'a Value,
    /// The source record being merged from, at this nesting level.
    pub source: &'a Value,
    /// Read-only view of the merge-in-progress bookkeeping.
    pub visited: &'a Visited,
}

/// Per-key merge policy override.
pub type Customizer<'a> = dyn Fn(&MergeSite<'_>) -> MergeDecision + 'a;

/// Call-scoped map from source substructure identity to the destination
/// record it was merged into.
///
/// Registering a source record *before* recursing into it is what breaks
/// reference cycles; looking it up on later encounters is what keeps two
/// aliases of one source substructure aliased in the destination.
#[derive(Default)]
pub struct Visited {
    merged: HashMap<usize, Value>,
}

impl Visited {
    fn new() -> Self {
        Self::default()
    }

    /// The destination record already produced for `source`, if this call
    /// has merged it before.
    pub fn resolved(&self, source: &Value) -> Option<Value> {
        match source {
            Value::Record(record) => self.merged.get(&addr_of(record)).cloned(),
            _ => None,
        }
    }

    /// Number of source substructures registered so far.
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    fn get(&self, source: &Rc<RefCell<Record>>) -> Option<Value> {
        self.merged.get(&addr_of(source)).cloned()
    }

    fn register(&mut self, source: &Rc<RefCell<Record>>, dest: Value) {
        self.merged.insert(addr_of(source), dest);
    }
}

fn addr_of(record: &Rc<RefCell<Record>>) -> usize {
    Rc::as_ptr(record) as usize
}

/// Deep-merge `sources` into `dest`, left-to-right, with default policy.
///
/// Mutates `dest` in place and returns a handle to the same record, so the
/// result is reference-identical to the destination passed in. Later
/// sources win at conflicting keys. A destination that is not a record
/// makes the call a no-op.
pub fn merge(dest: &Value, sources: &[Value]) -> Value {
    merge_impl(dest, sources, None)
}

/// Deep-merge `sources` into `dest`, consulting `customizer` per key.
///
/// The customizer runs before the default policy for every enumerable key
/// of every source. [`MergeDecision::Assign`] assigns its value verbatim;
/// [`MergeDecision::Defer`] falls through to the default policy.
pub fn merge_with(dest: &Value, sources: &[Value], customizer: &Customizer<'_>) -> Value {
    merge_impl(dest, sources, Some(customizer))
}

fn merge_impl(dest: &Value, sources: &[Value], customizer: Option<&Customizer<'_>>) -> Value {
    if let Value::Record(target) = dest {
        debug!(sources = sources.len(), "merging sources into destination");
        // One visited map spans all sources of this call.
        let mut visited = Visited::new();
        for source in sources {
            base_merge(target, source, customizer, &mut visited);
        }
    }
    dest.clone()
}

/// Merge one source into one destination record, recursively.
fn base_merge(
    target: &Rc<RefCell<Record>>,
    source: &Value,
    customizer: Option<&Customizer<'_>>,
    visited: &mut Visited,
) {
    // Only records expose enumerable key/value entries; merging from an
    // array, opaque, or primitive source is a no-op.
    let Value::Record(src) = source else {
        return;
    };

    // Snapshot the entries up front: the source graph may reach the
    // destination (or itself), and recursion below mutates records.
    let entries = src.borrow().enumerable_entries();
    let dest_value = Value::Record(target.clone());

    for (key, src_value) in entries {
        let obj_value = target.borrow().get(&key);

        if let Some(customizer) = customizer {
            let site = MergeSite {
                dest_value: obj_value.as_ref(),
                src_value: &src_value,
                key: &key,
                dest: &dest_value,
                source,
                visited,
            };
            if let MergeDecision::Assign(replacement) = customizer(&site) {
                target.borrow_mut().insert(key, replacement);
                continue;
            }
        }

        match (&obj_value, &src_value) {
            // Both sides are plain records: merge into the existing
            // destination record, in place.
            (Some(Value::Record(obj)), Value::Record(sub)) => {
                if let Some(cached) = visited.get(sub) {
                    trace!(key = %key, "reusing previously merged substructure");
                    target.borrow_mut().insert(key, cached);
                    continue;
                }
                // Register before recursing so cycles resolve to this
                // destination record.
                visited.register(sub, Value::Record(obj.clone()));
                base_merge(obj, &src_value, customizer, visited);
            }
            // Source side is a record but the destination side is not (or
            // is absent): allocate a destination record and merge into it.
            (_, Value::Record(sub)) => {
                if let Some(cached) = visited.get(sub) {
                    trace!(key = %key, "reusing previously merged substructure");
                    target.borrow_mut().insert(key, cached);
                    continue;
                }
                let next = Rc::new(RefCell::new(Record::new()));
                target
                    .borrow_mut()
                    .insert(key.clone(), Value::Record(next.clone()));
                visited.register(sub, Value::Record(next.clone()));
                base_merge(&next, &src_value, customizer, visited);
            }
            // Arrays, opaque values, and primitives are assigned by
            // replacement, sharing the source's storage.
            _ => {
                target.borrow_mut().insert(key, src_value);
            }
        }
    }
}
