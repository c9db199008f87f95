//! Deep object merging and right-to-left defaults composition.
//!
//! Two operations over a dynamic, reference-counted value model:
//!
//! - [`merge`] / [`merge_with`] — recursively merge source records into a
//!   destination record, in place, left-to-right. Plain records merge;
//!   arrays, opaque values, and primitives replace. An optional customizer
//!   overrides the policy per key. Cyclic sources and shared substructures
//!   are handled by a per-call visited map.
//! - [`defaults_deep`] — compose the same engine right-to-left into a fresh
//!   record, so earlier arguments take precedence, with arrays preserved by
//!   replacement and no input ever mutated.
//!
//! Dynamic data enters through the [`Value`] model (see
//! [`Value::from_json`]) and leaves through [`Value::to_json`].
//!
//! # Example
//!
//! ```
//! use defaults_deep::{Value, defaults_deep, merge};
//! use serde_json::json;
//!
//! let dest = Value::from_json(json!({ "a": { "x": 1 }, "b": 1 }));
//! merge(&dest, &[Value::from_json(json!({ "a": { "y": 2 }, "b": 2 }))]);
//! assert_eq!(dest.to_json().unwrap(), json!({ "a": { "x": 1, "y": 2 }, "b": 2 }));
//!
//! let out = defaults_deep(&[
//!     Value::from_json(json!({ "retry": 3 })),
//!     Value::from_json(json!({ "retry": 1, "timeout": 1000 })),
//! ]);
//! assert_eq!(out.to_json().unwrap(), json!({ "retry": 3, "timeout": 1000 }));
//! ```
//!
//! # Limitations
//!
//! Recursion depth is bounded only by the input's nesting depth. Reference
//! cycles are detected and defused, but a pathologically deep non-circular
//! structure can exhaust the call stack; no explicit depth limit is
//! enforced.

pub mod defaults;
pub mod error;
pub mod merge;
pub mod value;

pub use defaults::defaults_deep;
pub use error::ConvertError;
pub use merge::{Customizer, MergeDecision, MergeSite, Visited, merge, merge_with};
pub use value::{Key, Record, Symbol, Value};
