//! Form-level editability source

use std::fmt;
use std::sync::Arc;

use crate::Comparable;

/// Editability handed down by the owning form: either a fixed flag or a
/// per-field predicate evaluated against the field name.
#[derive(Clone)]
pub enum FormEditable {
    Constant(bool),
    Computed(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl FormEditable {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        FormEditable::Computed(Arc::new(f))
    }

    /// Resolve the flag for a field
    pub fn resolve(&self, name: &str) -> bool {
        match self {
            FormEditable::Constant(flag) => *flag,
            FormEditable::Computed(f) => f(name),
        }
    }
}

impl From<bool> for FormEditable {
    fn from(flag: bool) -> Self {
        FormEditable::Constant(flag)
    }
}

impl fmt::Debug for FormEditable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormEditable::Constant(flag) => write!(f, "Constant({})", flag),
            FormEditable::Computed(_) => write!(f, "Computed(<fn>)"),
        }
    }
}

impl Comparable for FormEditable {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FormEditable::Constant(a), FormEditable::Constant(b)) => a == b,
            (FormEditable::Computed(a), FormEditable::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}
