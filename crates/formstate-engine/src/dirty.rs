//! Dirty tracking
//!
//! Before any derivation runs, a mutation is compared property by property
//! against the current snapshot. Only properties the mutation carries are
//! ever marked; the rest are simply absent from the map.

use std::collections::{HashMap, HashSet};

use formstate_core::Comparable;
use serde_json::Value;

use crate::{FieldMutation, FieldState, Property, DEEP_PROPERTIES};

/// Per-property change flags for one commit
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyMap {
    flags: HashMap<Property, bool>,
}

impl DirtyMap {
    pub fn new() -> Self {
        DirtyMap::default()
    }

    /// Record whether a mutated property changed
    pub fn mark(&mut self, property: Property, changed: bool) {
        self.flags.insert(property, changed);
    }

    /// Force a property dirty (used by derivations that change a value
    /// the mutation did not touch)
    pub fn set_dirty(&mut self, property: Property) {
        self.flags.insert(property, true);
    }

    #[inline]
    pub fn is_dirty(&self, property: Property) -> bool {
        self.flags.get(&property).copied().unwrap_or(false)
    }

    /// Flag for a property, `None` when the mutation did not carry it
    pub fn get(&self, property: Property) -> Option<bool> {
        self.flags.get(&property).copied()
    }

    /// Check if anything changed at all
    pub fn any(&self) -> bool {
        self.flags.values().any(|changed| *changed)
    }

    /// Changed properties in declaration order
    pub fn dirty_properties(&self) -> Vec<Property> {
        let mut dirty: Vec<_> = self
            .flags
            .iter()
            .filter(|(_, changed)| **changed)
            .map(|(p, _)| *p)
            .collect();
        dirty.sort();
        dirty
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, bool)> + '_ {
        self.flags.iter().map(|(p, changed)| (*p, *changed))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Computes the dirty map for a candidate mutation
#[derive(Clone, Debug)]
pub struct DirtyTracker {
    deep: HashSet<Property>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        DirtyTracker::with_deep_properties(DEEP_PROPERTIES.iter().copied())
    }

    /// Tracker with a custom structural-comparison set
    pub fn with_deep_properties(deep: impl IntoIterator<Item = Property>) -> Self {
        DirtyTracker {
            deep: deep.into_iter().collect(),
        }
    }

    pub fn is_deep(&self, property: Property) -> bool {
        self.deep.contains(&property)
    }

    fn changed<T: Comparable>(&self, property: Property, current: &T, candidate: &T) -> bool {
        if self.is_deep(property) {
            !current.deep_eq(candidate)
        } else {
            !current.strict_eq(candidate)
        }
    }

    fn compare<T: Comparable>(
        &self,
        dirty: &mut DirtyMap,
        property: Property,
        current: &T,
        candidate: Option<&T>,
    ) {
        if let Some(candidate) = candidate {
            dirty.mark(property, self.changed(property, current, candidate));
        }
    }

    /// Diff a mutation against the current snapshot
    pub fn diff(&self, current: &FieldState, candidate: &FieldMutation) -> DirtyMap {
        let mut dirty = DirtyMap::new();
        let c = candidate;

        self.compare(&mut dirty, Property::Value, &current.value, c.value.as_ref());
        self.compare(&mut dirty, Property::Values, &current.values, c.values.as_ref());
        self.compare(
            &mut dirty,
            Property::InitialValue,
            &current.initial_value,
            c.initial_value.as_ref(),
        );

        self.compare(&mut dirty, Property::Errors, &current.errors, c.errors.as_ref());
        self.compare(&mut dirty, Property::Warnings, &current.warnings, c.warnings.as_ref());
        self.compare(
            &mut dirty,
            Property::EffectErrors,
            &current.effect_errors,
            c.effect_errors.as_ref(),
        );
        self.compare(
            &mut dirty,
            Property::EffectWarnings,
            &current.effect_warnings,
            c.effect_warnings.as_ref(),
        );
        self.compare(
            &mut dirty,
            Property::RuleErrors,
            &current.rule_errors,
            c.rule_errors.as_ref(),
        );
        self.compare(
            &mut dirty,
            Property::RuleWarnings,
            &current.rule_warnings,
            c.rule_warnings.as_ref(),
        );

        // An incoming flag is compared with the effective one a caller sees;
        // clearing only changes something when an override exists.
        match &c.editable {
            Some(None) => dirty.mark(Property::Editable, current.self_editable.is_some()),
            candidate => {
                let effective_editable = Some(current.editable);
                self.compare(&mut dirty, Property::Editable, &effective_editable, candidate.as_ref());
            }
        }
        self.compare(
            &mut dirty,
            Property::SelfEditable,
            &current.self_editable,
            c.self_editable.as_ref(),
        );
        self.compare(
            &mut dirty,
            Property::FormEditable,
            &current.form_editable,
            c.form_editable.as_ref(),
        );

        self.compare(&mut dirty, Property::Required, &current.required, c.required.as_ref());
        self.compare(&mut dirty, Property::Rules, &current.rules, c.rules.as_ref());
        self.compare(&mut dirty, Property::Visible, &current.visible, c.visible.as_ref());
        self.compare(&mut dirty, Property::Display, &current.display, c.display.as_ref());
        self.compare(
            &mut dirty,
            Property::VisibleCacheValue,
            &current.visible_cache_value,
            c.visible_cache_value.as_ref(),
        );
        self.compare(&mut dirty, Property::Mounted, &current.mounted, c.mounted.as_ref());
        self.compare(&mut dirty, Property::Unmounted, &current.unmounted, c.unmounted.as_ref());
        self.compare(
            &mut dirty,
            Property::UnmountRemoveValue,
            &current.unmount_remove_value,
            c.unmount_remove_value.as_ref(),
        );
        self.compare(&mut dirty, Property::Validating, &current.validating, c.validating.as_ref());
        self.compare(&mut dirty, Property::Loading, &current.loading, c.loading.as_ref());

        if let Some(props) = &c.props {
            let current_props = Value::Object(current.props.clone());
            dirty.mark(Property::Props, self.changed(Property::Props, &current_props, props));
        }

        self.compare(
            &mut dirty,
            Property::Initialized,
            &current.initialized,
            c.initialized.as_ref(),
        );

        dirty
    }
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldConfig;
    use serde_json::json;

    fn state() -> FieldState {
        FieldState::new(&FieldConfig::new("user.name"))
    }

    #[test]
    fn test_absent_properties_never_marked() {
        let tracker = DirtyTracker::new();
        let dirty = tracker.diff(&state(), &FieldMutation::new());
        assert!(dirty.is_empty());
        assert!(!dirty.any());
    }

    #[test]
    fn test_scalar_identity() {
        let tracker = DirtyTracker::new();
        let current = state();

        let dirty = tracker.diff(&current, &FieldMutation::new().visible(true).required(true));
        assert_eq!(dirty.get(Property::Visible), Some(false));
        assert_eq!(dirty.get(Property::Required), Some(true));
        assert_eq!(dirty.dirty_properties(), vec![Property::Required]);
    }

    #[test]
    fn test_composite_value_always_dirty() {
        let tracker = DirtyTracker::new();
        let mut current = state();
        current.value = Some(json!({"a": 1}));

        let dirty = tracker.diff(&current, &FieldMutation::new().value(json!({"a": 1})));
        assert!(dirty.is_dirty(Property::Value));

        current.value = Some(json!(5));
        let dirty = tracker.diff(&current, &FieldMutation::new().value(json!(5)));
        assert!(!dirty.is_dirty(Property::Value));
    }

    #[test]
    fn test_deep_properties_compare_structurally() {
        let tracker = DirtyTracker::new();
        let mut current = state();
        current.effect_errors = vec!["bad".to_string()];
        current.props = json!({"placeholder": "x"}).as_object().cloned().unwrap_or_default();

        let mutation = FieldMutation::new()
            .effect_errors(["bad"])
            .props(json!({"placeholder": "x"}));
        let dirty = tracker.diff(&current, &mutation);
        assert_eq!(dirty.get(Property::EffectErrors), Some(false));
        assert_eq!(dirty.get(Property::Props), Some(false));
        assert!(!dirty.any());
    }

    #[test]
    fn test_custom_deep_set() {
        let tracker = DirtyTracker::with_deep_properties([Property::Value]);
        let mut current = state();
        current.value = Some(json!([1, 2]));

        let dirty = tracker.diff(&current, &FieldMutation::new().value(json!([1, 2])));
        assert!(!dirty.is_dirty(Property::Value));
        assert!(!tracker.is_deep(Property::Props));
    }

    #[test]
    fn test_editable_compares_effective_flag() {
        let tracker = DirtyTracker::new();
        let current = state();

        let dirty = tracker.diff(&current, &FieldMutation::new().editable(true));
        assert!(!dirty.is_dirty(Property::Editable));

        let dirty = tracker.diff(&current, &FieldMutation::new().clear_editable());
        assert_eq!(dirty.get(Property::Editable), Some(false));

        let mut overridden = state();
        overridden.self_editable = Some(false);
        overridden.editable = false;
        let dirty = tracker.diff(&overridden, &FieldMutation::new().clear_editable());
        assert!(dirty.is_dirty(Property::Editable));
    }
}
