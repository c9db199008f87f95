//! Dynamic value model for the merge engine.
//!
//! External data is shaped into a closed set of variants before any merging
//! happens, so the engine dispatches on a tag instead of inspecting runtime
//! types. Arrays, records, and opaque values are reference types: cloning a
//! [`Value`] copies a handle, not the contents. Reference identity is what
//! the merge engine's cycle handling and aliasing guarantees are built on.

mod convert;
mod record;

pub use record::Record;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Number;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// An identity-token property key, the analogue of a JS symbol.
///
/// Every `Symbol::new` produces a distinct key; the description is for
/// diagnostics only and never participates in equality or hashing.
#[derive(Clone, Debug)]
pub struct Symbol {
    id: u64,
    description: Option<Rc<str>>,
}

impl Symbol {
    /// Create a fresh symbol with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Some(Rc::from(description.into())),
        }
    }

    /// Create a fresh symbol with no description.
    pub fn anonymous() -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    /// The description given at creation, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A property key: a string or a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Str(String),
    Sym(Symbol),
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::Str(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::Str(key)
    }
}

impl From<Symbol> for Key {
    fn from(key: Symbol) -> Self {
        Key::Sym(key)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s}"),
            Key::Sym(sym) => match sym.description() {
                Some(desc) => write!(f, "Symbol({desc})"),
                None => write!(f, "Symbol()"),
            },
        }
    }
}

/// A dynamically shaped value.
///
/// `Null`, `Bool`, `Number`, and `String` are value types. `Array`,
/// `Record`, and `Opaque` are shared handles: `clone` aliases the same
/// underlying storage, and assignment during a merge shares the source's
/// storage rather than copying it.
///
/// `Opaque` carries anything that is object-like but not a plain record
/// (the analogue of class instances, dates, maps, sets). The merge engine
/// never looks inside an opaque value; it is always assigned whole, with
/// identity preserved.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Record(Rc<RefCell<Record>>),
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// A fresh, empty record.
    pub fn record() -> Value {
        Value::Record(Rc::new(RefCell::new(Record::new())))
    }

    /// A fresh array holding `items`.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Wrap an arbitrary value as an opaque handle.
    pub fn opaque<T: Any>(value: T) -> Value {
        Value::Opaque(Rc::new(value))
    }

    /// Downcast an opaque value to its concrete type.
    pub fn downcast_opaque<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Value::Opaque(inner) => inner.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Loosely object-like: anything with reference identity. This is the
    /// minimal gate for participating in merge/defaults processing.
    pub fn is_object_loose(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Record(_) | Value::Opaque(_))
    }

    /// A plain record, eligible for recursive merging. Arrays and opaque
    /// values are never plain.
    pub fn is_plain_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    /// The record handle, if this is a record.
    pub fn as_record(&self) -> Option<&Rc<RefCell<Record>>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The array handle, if this is an array.
    pub fn as_array(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number as an `i64`, if this is an integral number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// The number as an `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Read a property from a record value. Returns `None` for non-records
    /// and missing keys alike.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        self.as_record()?.borrow().get(&key)
    }

    /// Assign a property on a record value. Has no effect on non-records.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) {
        if let Value::Record(record) = self {
            record.borrow_mut().insert(key, value);
        }
    }

    /// Reference identity. True only when both sides are handles to the
    /// same array, record, or opaque storage; value types are never
    /// identical, only equal.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => opaque_ptr_eq(a, b),
            _ => false,
        }
    }

    /// Stable address of the underlying storage, for identity-keyed maps.
    pub(crate) fn heap_addr(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(Rc::as_ptr(items) as usize),
            Value::Record(record) => Some(Rc::as_ptr(record) as usize),
            Value::Opaque(inner) => Some(Rc::as_ptr(inner) as *const () as usize),
            _ => None,
        }
    }
}

/// Compare opaque handles by data address, ignoring vtables.
fn opaque_ptr_eq(a: &Rc<dyn Any>, b: &Rc<dyn Any>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

/// Structural equality over enumerable contents.
///
/// Records compare their enumerable entries as unordered key/value sets;
/// non-enumerable entries are invisible here, as they are to the merge
/// engine. Opaque values compare by identity. Comparing cyclic values does
/// not terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Record(a), Value::Record(b)) => {
                Rc::ptr_eq(a, b) || records_eq(&a.borrow(), &b.borrow())
            }
            (Value::Opaque(a), Value::Opaque(b)) => opaque_ptr_eq(a, b),
            _ => false,
        }
    }
}

fn records_eq(a: &Record, b: &Record) -> bool {
    let entries = a.enumerable_entries();
    if entries.len() != b.enumerable_entries().len() {
        return false;
    }
    entries
        .iter()
        .all(|(key, value)| b.get_enumerable(key).as_ref() == Some(value))
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Record(record) => {
                let record = record.borrow();
                let mut map = f.debug_map();
                for (key, value) in record.enumerable_entries() {
                    map.entry(&key.to_string(), &value);
                }
                map.finish()
            }
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        // Non-finite floats have no JSON representation; treat them as null.
        match Number::from_f64(value) {
            Some(n) => Value::Number(n),
            None => Value::Null,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}
