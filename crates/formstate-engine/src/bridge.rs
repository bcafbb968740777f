//! Value/visibility bridge
//!
//! Everything the pipeline writes through the external store goes through
//! here: externalizing committed values, and the hide/show dance that parks
//! a hidden field's value in `visible_cache_value` and brings it back when
//! the field is shown again.

use formstate_core::is_valid;
use tracing::{debug, trace};

use crate::{DirtyMap, FieldState, FieldStore, Property};

/// Which state changes count as hiding a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityPolicy {
    /// Invisible or unmounted fields drop their value
    RemoveOnHide,
    /// Only visibility matters; mount state is ignored
    VisibleOnly,
}

impl VisibilityPolicy {
    pub fn for_field(state: &FieldState, store: &dyn FieldStore) -> Self {
        if state.unmount_remove_value && store.need_remove_value(&state.path) {
            VisibilityPolicy::RemoveOnHide
        } else {
            VisibilityPolicy::VisibleOnly
        }
    }

    pub fn is_hidden(self, state: &FieldState) -> bool {
        match self {
            VisibilityPolicy::RemoveOnHide => !state.visible || state.unmounted,
            VisibilityPolicy::VisibleOnly => !state.visible,
        }
    }

    /// Check if the dirty set can move the field across the hidden line
    pub fn triggered_by(self, dirty: &DirtyMap) -> bool {
        match self {
            VisibilityPolicy::RemoveOnHide => {
                dirty.is_dirty(Property::Visible)
                    || dirty.is_dirty(Property::Mounted)
                    || dirty.is_dirty(Property::Unmounted)
            }
            VisibilityPolicy::VisibleOnly => dirty.is_dirty(Property::Visible),
        }
    }
}

/// Store-facing side of a commit
pub struct ValueBridge<'a> {
    store: &'a dyn FieldStore,
}

impl<'a> ValueBridge<'a> {
    pub fn new(store: &'a dyn FieldStore) -> Self {
        ValueBridge { store }
    }

    pub fn externalize_value(&self, state: &FieldState) {
        debug!(field = %state.name, "externalizing value");
        self.store.set_value(&state.name, state.value.clone());
    }

    pub fn externalize_initial_value(&self, state: &FieldState) {
        debug!(field = %state.name, "externalizing initial value");
        self.store
            .set_initial_value(&state.name, state.initial_value.clone());
    }

    /// Apply hide/show value handling for one commit.
    ///
    /// A hidden field loses any value it holds, whether it just became
    /// hidden or a value was written while it already was. A show restores
    /// the cache only when the field crosses back from hidden.
    pub fn sync_visibility(&self, draft: &mut FieldState, previous: &FieldState, dirty: &DirtyMap) {
        if !draft.display {
            return;
        }
        if !(dirty.is_dirty(Property::Visible)
            || dirty.is_dirty(Property::Mounted)
            || dirty.is_dirty(Property::Unmounted))
        {
            return;
        }

        let policy = VisibilityPolicy::for_field(draft, self.store);
        if !policy.triggered_by(dirty) {
            return;
        }

        if policy.is_hidden(draft) {
            self.hide(draft, dirty, policy);
        } else if policy.is_hidden(previous) {
            self.show(draft, policy);
        } else {
            trace!(field = %draft.name, ?policy, "field stays shown");
        }
    }

    fn hide(&self, draft: &mut FieldState, dirty: &DirtyMap, policy: VisibilityPolicy) {
        // Already cleared: the cache still holds the value worth restoring
        if !is_valid(&draft.value) {
            trace!(field = %draft.name, ?policy, "hidden field already empty");
            return;
        }
        if !dirty.is_dirty(Property::VisibleCacheValue) {
            draft.visible_cache_value = draft.value.clone();
        }
        debug!(field = %draft.name, ?policy, "field hidden, clearing value");
        draft.put_value(None);
        draft.refresh_pristine();
        self.externalize_value(draft);
    }

    fn show(&self, draft: &mut FieldState, policy: VisibilityPolicy) {
        if is_valid(&draft.value) {
            return;
        }
        debug!(field = %draft.name, ?policy, "field shown, restoring cached value");
        let cached = draft.visible_cache_value.clone();
        draft.put_value(cached);
        draft.refresh_pristine();
        self.externalize_value(draft);
    }
}
