//! Right-to-left defaults composition on top of the merge engine.
//!
//! [`defaults_deep`] builds a fresh record and merges the arguments into it
//! in reverse order, so each later merge overwrites the ones before it and
//! values from *earlier* arguments end up winning. No input is ever
//! mutated; the engine only writes into the freshly allocated output.

use tracing::debug;

use crate::merge::{MergeDecision, merge_with};
use crate::value::Value;

/// Deeply apply defaults, earlier arguments taking precedence.
///
/// Plain records merge recursively across arguments; arrays are preserved
/// by replacement, never merged element-wise. Arguments that are not
/// loosely object-like (null, booleans, numbers, strings) contribute
/// nothing and cause no error. Always returns a new record, distinct by
/// identity from every argument — `{}` when nothing qualifies.
///
/// # Example
///
/// ```
/// use defaults_deep::{Value, defaults_deep};
/// use serde_json::json;
///
/// let out = defaults_deep(&[
///     Value::from_json(json!({ "a": 1, "nested": { "x": 1 }, "list": [1] })),
///     Value::from_json(json!({ "a": 2, "nested": { "y": 2 }, "list": [2] })),
/// ]);
/// assert_eq!(
///     out.to_json().unwrap(),
///     json!({ "a": 1, "nested": { "x": 1, "y": 2 }, "list": [1] })
/// );
/// ```
pub fn defaults_deep(args: &[Value]) -> Value {
    let output = Value::record();

    for item in args.iter().rev() {
        if !item.is_object_loose() {
            debug!("skipping non-object argument");
            continue;
        }

        // Arrays from sources replace wholesale. The engine never merges
        // into arrays anyway; this pins the behavior independently of how
        // plain-record classification might evolve.
        merge_with(&output, std::slice::from_ref(item), &|site| {
            if matches!(site.src_value, Value::Array(_)) {
                MergeDecision::Assign(site.src_value.clone())
            } else {
                MergeDecision::Defer
            }
        });
    }

    output
}
