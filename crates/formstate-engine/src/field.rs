//! Field state - the canonical snapshot of one form field

use formstate_core::{deep_equal, FieldValue, FormEditable, Record, Rule};
use serde::Serialize;
use serde_json::Value;

use crate::{is_array_type, ArrayTags, DirtyMap, FieldConfig, FieldMutation, Property};

/// Snapshot of a field's state.
///
/// Invariants after every commit:
/// - `value == values[0]`
/// - `errors == rule_errors ++ effect_errors` (same for warnings)
/// - `invalid == !errors.is_empty()` and `valid == !invalid`
/// - `mounted == !unmounted` once either has been written
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub name: String,
    pub path: String,
    pub data_type: String,

    pub value: FieldValue,
    pub values: Vec<FieldValue>,
    pub initial_value: FieldValue,
    pub pristine: bool,
    pub modified: bool,

    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub effect_errors: Vec<String>,
    pub effect_warnings: Vec<String>,
    pub rule_errors: Vec<String>,
    pub rule_warnings: Vec<String>,
    pub valid: bool,
    pub invalid: bool,

    /// Effective editability
    pub editable: bool,
    /// The field's own override
    pub self_editable: Option<bool>,
    #[serde(skip)]
    pub form_editable: Option<FormEditable>,

    pub required: bool,
    pub rules: Vec<Rule>,

    pub visible: bool,
    pub display: bool,
    pub visible_cache_value: FieldValue,
    pub mounted: bool,
    pub unmounted: bool,
    pub unmount_remove_value: bool,

    pub validating: Option<bool>,
    pub loading: bool,
    pub props: Record,
    pub initialized: bool,

    #[serde(skip)]
    pub(crate) value_tags: ArrayTags,
    #[serde(skip)]
    pub(crate) initial_value_tags: ArrayTags,
}

impl FieldState {
    pub fn new(config: &FieldConfig) -> Self {
        FieldState {
            name: config.name(),
            path: config.path(),
            data_type: config.resolved_data_type(),
            value: None,
            values: vec![None],
            initial_value: None,
            pristine: true,
            modified: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            effect_errors: Vec::new(),
            effect_warnings: Vec::new(),
            rule_errors: Vec::new(),
            rule_warnings: Vec::new(),
            valid: true,
            invalid: false,
            editable: true,
            self_editable: None,
            form_editable: None,
            required: false,
            rules: Vec::new(),
            visible: true,
            display: true,
            visible_cache_value: None,
            mounted: false,
            unmounted: false,
            unmount_remove_value: true,
            validating: None,
            loading: false,
            props: Record::new(),
            initialized: false,
            value_tags: ArrayTags::new(),
            initial_value_tags: ArrayTags::new(),
        }
    }

    /// Check if this field holds a reorderable list
    pub fn is_array_list(&self) -> bool {
        is_array_type(&self.data_type)
    }

    /// Item tag of `value[index]`
    pub fn value_tag(&self, index: usize) -> Option<&str> {
        self.value_tags.get(index)
    }

    /// Item tag of `initial_value[index]`
    pub fn initial_value_tag(&self, index: usize) -> Option<&str> {
        self.initial_value_tags.get(index)
    }

    pub fn value_tags(&self) -> &ArrayTags {
        &self.value_tags
    }

    /// Move one element of an array value and its tag together.
    ///
    /// Returns false (and changes nothing) for non-array values, equal
    /// indexes or indexes out of range.
    pub(crate) fn reorder_value(&mut self, from: usize, to: usize) -> bool {
        let Some(Value::Array(items)) = &mut self.value else {
            return false;
        };
        if from == to || from >= items.len() || to >= items.len() {
            return false;
        }
        let item = items.remove(from);
        items.insert(to, item);
        self.value_tags.move_item(from, to);
        if let Some(slot) = self.values.first_mut() {
            *slot = self.value.clone();
        }
        true
    }

    /// Write the canonical value slot, keeping `values[0]` in step
    pub(crate) fn put_value(&mut self, value: FieldValue) {
        if self.is_array_list() {
            self.value_tags.tag(&self.name, &self.value, &value, false);
        }
        match self.values.first_mut() {
            Some(slot) => *slot = value.clone(),
            None => self.values.push(value.clone()),
        }
        self.value = value;
    }

    pub(crate) fn put_initial_value(&mut self, value: FieldValue) {
        if self.is_array_list() {
            self.initial_value_tags
                .tag(&self.name, &self.initial_value, &value, false);
        }
        self.initial_value = value;
    }

    pub(crate) fn refresh_pristine(&mut self) {
        self.pristine = deep_equal(&self.initial_value, &self.value);
    }

    /// Copy the directly-assigned properties of a mutation.
    ///
    /// Properties that a pipeline stage derives from the mutation (the value
    /// slots, the message channels, editable, props) are left to the stages.
    pub(crate) fn assign(&mut self, mutation: &FieldMutation, dirty: &DirtyMap) {
        if let (true, Some(flag)) = (dirty.is_dirty(Property::SelfEditable), mutation.self_editable) {
            self.self_editable = flag;
        }
        if let (true, Some(source)) = (dirty.is_dirty(Property::FormEditable), &mutation.form_editable) {
            self.form_editable = source.clone();
        }
        if let (true, Some(required)) = (dirty.is_dirty(Property::Required), mutation.required) {
            self.required = required;
        }
        if let (true, Some(rules)) = (dirty.is_dirty(Property::Rules), &mutation.rules) {
            self.rules = rules.clone();
        }
        if let (true, Some(visible)) = (dirty.is_dirty(Property::Visible), mutation.visible) {
            self.visible = visible;
        }
        if let (true, Some(display)) = (dirty.is_dirty(Property::Display), mutation.display) {
            self.display = display;
        }
        if let (true, Some(cached)) = (
            dirty.is_dirty(Property::VisibleCacheValue),
            &mutation.visible_cache_value,
        ) {
            self.visible_cache_value = cached.clone();
        }
        if let (true, Some(mounted)) = (dirty.is_dirty(Property::Mounted), mutation.mounted) {
            self.mounted = mounted;
        }
        if let (true, Some(unmounted)) = (dirty.is_dirty(Property::Unmounted), mutation.unmounted) {
            self.unmounted = unmounted;
        }
        if let (true, Some(remove)) = (
            dirty.is_dirty(Property::UnmountRemoveValue),
            mutation.unmount_remove_value,
        ) {
            self.unmount_remove_value = remove;
        }
        if let (true, Some(validating)) = (dirty.is_dirty(Property::Validating), mutation.validating) {
            self.validating = validating;
        }
        if let (true, Some(loading)) = (dirty.is_dirty(Property::Loading), mutation.loading) {
            self.loading = loading;
        }
        if let (true, Some(initialized)) = (dirty.is_dirty(Property::Initialized), mutation.initialized) {
            self.initialized = initialized;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let state = FieldState::new(&FieldConfig::default());
        assert_eq!(state.name, "");
        assert_eq!(state.path, "");
        assert_eq!(state.data_type, "any");
        assert_eq!(state.values, vec![None]);
        assert!(state.pristine && state.valid && !state.invalid);
        assert!(state.editable && state.visible && state.display);
        assert!(state.unmount_remove_value);
        assert!(!state.is_array_list());
    }

    #[test]
    fn test_put_value_keeps_slot_zero() {
        let mut state = FieldState::new(&FieldConfig::new("tags").data_type("array"));
        state.values.clear();
        state.put_value(Some(json!([{"label": "a"}])));

        assert_eq!(state.values.len(), 1);
        assert_eq!(state.value, state.values[0]);
        assert_eq!(state.value_tag(0), Some("tags.0"));
    }

    #[test]
    fn test_reorder_value_moves_tag() {
        let mut state = FieldState::new(&FieldConfig::new("rows").data_type("array"));
        state.put_value(Some(json!([{"n": 1}, {"n": 2}, {"n": 3}])));

        assert!(state.reorder_value(2, 0));
        assert_eq!(state.value, Some(json!([{"n": 3}, {"n": 1}, {"n": 2}])));
        assert_eq!(state.values[0], state.value);
        assert_eq!(state.value_tag(0), Some("rows.2"));
        assert_eq!(state.value_tag(1), Some("rows.0"));

        assert!(!state.reorder_value(0, 3));
        assert!(!state.reorder_value(1, 1));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let state = FieldState::new(&FieldConfig::new("age"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["name"], json!("age"));
        assert_eq!(json["initialValue"], serde_json::Value::Null);
        assert_eq!(json["unmountRemoveValue"], json!(true));
        assert!(json.get("formEditable").is_none());
    }
}
