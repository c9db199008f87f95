//! Integration tests for the merge engine.
//!
//! Covers the public `merge`/`merge_with` contract: destination identity,
//! recursive record merging, replacement semantics for arrays and opaque
//! values, customizer overrides, enumeration rules, cycle handling, and
//! shared-substructure topology.

use std::cell::RefCell;

use defaults_deep::{Key, MergeDecision, Symbol, Value, merge, merge_with};
use serde_json::json;

/// Install a test subscriber once; respects RUST_LOG for debugging runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn v(json: serde_json::Value) -> Value {
    Value::from_json(json)
}

#[test]
fn test_merge_mutates_and_returns_the_same_reference() {
    init_tracing();
    let target = v(json!({ "a": 1 }));

    let out = merge(&target, &[v(json!({ "b": 2 }))]);

    assert!(out.ptr_eq(&target));
    assert_eq!(target, v(json!({ "a": 1, "b": 2 })));
}

#[test]
fn test_merge_merges_plain_records_recursively() {
    init_tracing();
    let target = v(json!({ "a": { "x": 1 }, "b": 1 }));

    merge(&target, &[v(json!({ "a": { "y": 2 }, "b": 2 }))]);

    assert_eq!(target, v(json!({ "a": { "x": 1, "y": 2 }, "b": 2 })));
}

#[test]
fn test_merge_creates_record_when_destination_side_is_not_plain() {
    init_tracing();
    let target = v(json!({ "a": 123 }));

    merge(&target, &[v(json!({ "a": { "x": 1 } }))]);

    assert_eq!(target, v(json!({ "a": { "x": 1 } })));
    assert!(target.get("a").unwrap().is_plain_record());
}

#[test]
fn test_merge_arrays_replace_by_default_with_same_reference() {
    init_tracing();
    let target = v(json!({ "list": [1] }));
    let source = v(json!({ "list": [2] }));

    merge(&target, std::slice::from_ref(&source));

    assert_eq!(target, v(json!({ "list": [2] })));
    // Replacement assigns the source array handle, not a copy.
    assert!(target.get("list").unwrap().ptr_eq(&source.get("list").unwrap()));
}

#[test]
fn test_merge_array_replacement_is_not_a_clone() {
    init_tracing();
    let target = v(json!({ "list": [1] }));
    let source = v(json!({ "list": [2] }));

    merge(&target, std::slice::from_ref(&source));

    // Mutating the source array afterwards is visible through the target.
    if let Some(items) = source.get("list").unwrap().as_array() {
        items.borrow_mut().push(Value::from(3));
    }
    assert_eq!(target.get("list").unwrap(), Value::array(vec![
        Value::from(2),
        Value::from(3),
    ]));
}

#[test]
fn test_merge_customizer_can_concat_arrays() {
    init_tracing();
    let target = v(json!({ "a": [1], "b": [2] }));
    let source = v(json!({ "a": [3], "b": [4] }));

    merge_with(&target, std::slice::from_ref(&source), &|site| {
        if let (Some(Value::Array(dest)), Value::Array(src)) = (site.dest_value, site.src_value) {
            let mut combined = dest.borrow().clone();
            combined.extend(src.borrow().iter().cloned());
            return MergeDecision::Assign(Value::array(combined));
        }
        MergeDecision::Defer
    });

    assert_eq!(target, v(json!({ "a": [1, 3], "b": [2, 4] })));
}

#[test]
fn test_merge_customizer_result_is_assigned_even_when_falsy() {
    init_tracing();
    let target = v(json!({ "a": 1, "b": 2, "c": 3, "d": 4 }));
    let source = v(json!({ "a": 10, "b": 20, "c": 30, "d": 40 }));

    merge_with(&target, std::slice::from_ref(&source), &|site| {
        match site.key {
            Key::Str(name) if name == "a" => MergeDecision::Assign(Value::Null),
            Key::Str(name) if name == "b" => MergeDecision::Assign(Value::from(false)),
            Key::Str(name) if name == "c" => MergeDecision::Assign(Value::from(0)),
            Key::Str(name) if name == "d" => MergeDecision::Assign(Value::from("")),
            _ => MergeDecision::Defer,
        }
    });

    assert_eq!(target, v(json!({ "a": null, "b": false, "c": 0, "d": "" })));
}

#[test]
fn test_merge_customizer_is_called_with_expected_arguments() {
    init_tracing();
    let target = v(json!({ "a": 1 }));
    let source = v(json!({ "a": 2 }));

    struct Call {
        dest_value: Option<Value>,
        src_value: Value,
        key: Key,
        dest: Value,
        source: Value,
        visited_empty: bool,
    }
    let calls: RefCell<Vec<Call>> = RefCell::new(Vec::new());

    merge_with(&target, std::slice::from_ref(&source), &|site| {
        calls.borrow_mut().push(Call {
            dest_value: site.dest_value.cloned(),
            src_value: site.src_value.clone(),
            key: site.key.clone(),
            dest: site.dest.clone(),
            source: site.source.clone(),
            visited_empty: site.visited.is_empty(),
        });
        MergeDecision::Defer
    });

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dest_value, Some(Value::from(1)));
    assert_eq!(calls[0].src_value, Value::from(2));
    assert_eq!(calls[0].key, Key::from("a"));
    assert!(calls[0].dest.ptr_eq(&target));
    assert!(calls[0].source.ptr_eq(&source));
    assert!(calls[0].visited_empty);
}

#[test]
fn test_merge_multiple_sources_left_to_right() {
    init_tracing();
    let target = v(json!({ "a": 1, "nested": { "x": 1 } }));

    merge(
        &target,
        &[
            v(json!({ "a": 2, "nested": { "y": 2 } })),
            v(json!({ "a": 3, "nested": { "z": 3 } })),
        ],
    );

    assert_eq!(target, v(json!({ "a": 3, "nested": { "x": 1, "y": 2, "z": 3 } })));
}

#[test]
fn test_merge_merges_enumerable_symbol_keys() {
    init_tracing();
    let sym = Symbol::new("k");
    let target = Value::record();
    let source = Value::record();
    source.insert(sym.clone(), 123);

    merge(&target, std::slice::from_ref(&source));

    assert_eq!(target.get(sym), Some(Value::from(123)));
}

#[test]
fn test_merge_skips_non_enumerable_entries() {
    init_tracing();
    let target = Value::record();
    let source = Value::record();
    if let Some(record) = source.as_record() {
        record.borrow_mut().define("hidden", 42, false);
    }

    merge(&target, std::slice::from_ref(&source));

    assert_eq!(target.get("hidden"), None);
}

#[test]
fn test_merge_assigns_opaque_values_by_replacement() {
    init_tracing();
    struct Gadget {
        value: i32,
    }

    let target = v(json!({ "box": { "value": 1 } }));
    let source = Value::record();
    source.insert("box", Value::opaque(Gadget { value: 2 }));

    merge(&target, std::slice::from_ref(&source));

    let merged = target.get("box").unwrap();
    assert!(merged.ptr_eq(&source.get("box").unwrap()));
    assert_eq!(merged.downcast_opaque::<Gadget>().map(|g| g.value), Some(2));
}

#[test]
fn test_merge_circular_source_terminates() {
    init_tracing();
    let target = Value::record();
    let source = Value::record();
    let inner = Value::record();
    inner.insert("self", source.clone());
    source.insert("a", inner);

    merge(&target, std::slice::from_ref(&source));

    let a = target.get("a").unwrap();
    assert!(a.is_object_loose());
    // The cycle resolves back into the merged graph, not the source.
    let round_trip = a.get("self").unwrap().get("a").unwrap();
    assert!(round_trip.ptr_eq(&a));
}

#[test]
fn test_merge_repeated_source_record_reuses_merged_reference() {
    init_tracing();
    let shared = v(json!({ "deep": { "x": 1 } }));
    let source = Value::record();
    source.insert("a", shared.clone());
    source.insert("b", shared);

    let target = Value::record();
    merge(&target, std::slice::from_ref(&source));

    assert_eq!(target.get("a").unwrap(), v(json!({ "deep": { "x": 1 } })));
    // Aliasing in the source is preserved in the destination.
    assert!(target.get("a").unwrap().ptr_eq(&target.get("b").unwrap()));
}

#[test]
fn test_merge_does_not_mutate_sources() {
    init_tracing();
    let target = v(json!({ "nested": { "x": 1 } }));
    let source = v(json!({ "nested": { "y": 2 } }));

    merge(&target, std::slice::from_ref(&source));

    assert_eq!(source, v(json!({ "nested": { "y": 2 } })));
}

#[test]
fn test_merge_disjoint_keys_is_the_union() {
    init_tracing();
    let target = Value::record();

    merge(&target, &[v(json!({ "a": 1 })), v(json!({ "b": 2 }))]);

    assert_eq!(target, v(json!({ "a": 1, "b": 2 })));
}
