//! Field values and comparison helpers
//!
//! A field value is dynamic JSON with one extra state: *unset*. `None` plays
//! the role of "undefined" and is distinct from an explicit `Some(Value::Null)`.

use serde_json::{Map, Value};

/// A possibly-unset field value
pub type FieldValue = Option<Value>;

/// Open key/value record used for `props` and rule entries
pub type Record = Map<String, Value>;

/// Check if a value is present (neither unset nor null)
#[inline]
pub fn is_valid(value: &FieldValue) -> bool {
    !matches!(value, None | Some(Value::Null))
}

/// Structural equality; unset only equals unset
pub fn deep_equal(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Dynamic truthiness (`false`, `0`, `""` and `null` are falsy)
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Property comparison used by dirty tracking.
///
/// `strict_eq` mirrors reference identity: composites handed in by a
/// mutation are always freshly built, so they never compare identical.
/// `deep_eq` is plain structural equality.
pub trait Comparable {
    fn strict_eq(&self, other: &Self) -> bool;

    fn deep_eq(&self, other: &Self) -> bool;
}

impl Comparable for bool {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl Comparable for String {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl Comparable for Value {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(_), _) | (Value::Object(_), _) => false,
            _ => self == other,
        }
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: Comparable> Comparable for Option<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.strict_eq(b),
            _ => false,
        }
    }

    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.deep_eq(b),
            _ => false,
        }
    }
}

impl<T: Comparable> Comparable for Vec<T> {
    fn strict_eq(&self, _other: &Self) -> bool {
        false
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.deep_eq(b))
    }
}
