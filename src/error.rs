//! Error types for the JSON boundary.
//!
//! The merge engine and defaults composer never fail: unmergeable inputs
//! fall back to replacement and non-object arguments are skipped. Errors
//! only arise when leaving the dynamic value model for JSON.

use thiserror::Error;

/// Failure to represent a [`Value`](crate::Value) as JSON.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConvertError {
    /// The value graph contains a reference cycle, which JSON cannot
    /// represent.
    #[error("value graph contains a reference cycle")]
    CyclicValue,

    /// Opaque values have no JSON representation.
    #[error("opaque value cannot be represented as JSON")]
    OpaqueValue,
}
