//! External store collaborator
//!
//! The engine never owns form data. It reads externally-sourced values from
//! and pushes committed values to a [`FieldStore`]. Every callback has a
//! no-op default, so a store only implements what it actually backs.
//!
//! Callbacks run synchronously inside a commit or read and must not commit
//! on the same field again.

use std::collections::{HashMap, HashSet};

use formstate_core::FieldValue;
use parking_lot::Mutex;

pub trait FieldStore: Send + Sync {
    /// Current externally-held value. `None` means the store does not
    /// source values and the engine's cached value is authoritative.
    fn get_value(&self, _name: &str) -> Option<FieldValue> {
        None
    }

    /// Externally-held initial value, consulted only while the field's own
    /// initial value is unset.
    fn get_initial_value(&self, _name: &str) -> Option<FieldValue> {
        None
    }

    fn set_value(&self, _name: &str, _value: FieldValue) {}

    fn set_initial_value(&self, _name: &str, _value: FieldValue) {}

    /// Whether hiding the field at `path` should remove its value
    fn need_remove_value(&self, _path: &str) -> bool {
        false
    }

    /// A read found the external value drifted from the cached one
    fn uncontrolled_value_changed(&self, _name: &str) {}
}

/// Store that backs nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStore;

impl FieldStore for NoopStore {}

/// Recorded store callback
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    SetValue { name: String, value: FieldValue },
    SetInitialValue { name: String, value: FieldValue },
    UncontrolledValueChanged { name: String },
}

/// In-memory keyed store with a call journal
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Serve reads from the store instead of the engine cache
    sources_values: bool,
    values: Mutex<HashMap<String, FieldValue>>,
    initial_values: Mutex<HashMap<String, FieldValue>>,
    removable: Mutex<HashSet<String>>,
    journal: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    /// Write-only store; the engine's cache stays authoritative
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store that also sources values for reads
    pub fn controlled() -> Self {
        MemoryStore {
            sources_values: true,
            ..MemoryStore::default()
        }
    }

    /// Change a value behind the engine's back
    pub fn put_value(&self, name: &str, value: FieldValue) {
        self.values.lock().insert(name.to_string(), value);
    }

    pub fn put_initial_value(&self, name: &str, value: FieldValue) {
        self.initial_values.lock().insert(name.to_string(), value);
    }

    pub fn value(&self, name: &str) -> FieldValue {
        self.values.lock().get(name).cloned().flatten()
    }

    pub fn initial_value(&self, name: &str) -> FieldValue {
        self.initial_values.lock().get(name).cloned().flatten()
    }

    /// Opt a path into remove-on-hide
    pub fn mark_removable(&self, path: &str) {
        self.removable.lock().insert(path.to_string());
    }

    pub fn unmark_removable(&self, path: &str) {
        self.removable.lock().remove(path);
    }

    /// Snapshot of the call journal
    pub fn calls(&self) -> Vec<StoreCall> {
        self.journal.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.journal.lock().len()
    }

    pub fn clear_calls(&self) {
        self.journal.lock().clear();
    }
}

impl FieldStore for MemoryStore {
    fn get_value(&self, name: &str) -> Option<FieldValue> {
        if !self.sources_values {
            return None;
        }
        Some(self.value(name))
    }

    fn get_initial_value(&self, name: &str) -> Option<FieldValue> {
        if !self.sources_values {
            return None;
        }
        Some(self.initial_value(name))
    }

    fn set_value(&self, name: &str, value: FieldValue) {
        self.put_value(name, value.clone());
        self.journal.lock().push(StoreCall::SetValue {
            name: name.to_string(),
            value,
        });
    }

    fn set_initial_value(&self, name: &str, value: FieldValue) {
        self.put_initial_value(name, value.clone());
        self.journal.lock().push(StoreCall::SetInitialValue {
            name: name.to_string(),
            value,
        });
    }

    fn need_remove_value(&self, path: &str) -> bool {
        self.removable.lock().contains(path)
    }

    fn uncontrolled_value_changed(&self, name: &str) {
        self.journal.lock().push(StoreCall::UncontrolledValueChanged {
            name: name.to_string(),
        });
    }
}
