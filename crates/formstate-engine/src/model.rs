//! Field model - owns a field's snapshot and applies commits

use std::sync::Arc;

use formstate_core::{deep_equal, is_valid, FormStateError, FormStateResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    is_array_type, reconcile, CommitContext, DirtyTracker, FieldMutation, FieldState, FieldStore,
    NoopStore,
};

pub const DEFAULT_DATA_TYPE: &str = "any";

/// Field construction input
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfig {
    /// Address in the form's node tree, becomes `path`
    pub node_path: Option<String>,
    /// Address in the form's data, becomes `name`
    pub data_path: Option<String>,
    pub data_type: Option<String>,
}

impl FieldConfig {
    pub fn new(data_path: impl Into<String>) -> Self {
        FieldConfig {
            data_path: Some(data_path.into()),
            ..FieldConfig::default()
        }
    }

    pub fn from_json(json: &str) -> FormStateResult<Self> {
        serde_json::from_str(json).map_err(FormStateError::InvalidConfig)
    }

    pub fn node_path(mut self, path: impl Into<String>) -> Self {
        self.node_path = Some(path.into());
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn name(&self) -> String {
        self.data_path.clone().unwrap_or_default()
    }

    pub fn path(&self) -> String {
        self.node_path.clone().unwrap_or_default()
    }

    pub fn resolved_data_type(&self) -> String {
        self.data_type
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_TYPE.to_string())
    }

    pub fn is_array_list(&self) -> bool {
        is_array_type(&self.resolved_data_type())
    }
}

/// State container for one field.
///
/// Commits are serialized by `&mut self`; store callbacks run inline and
/// cannot re-enter the same model.
pub struct FieldModel {
    state: Arc<FieldState>,
    tracker: DirtyTracker,
    store: Arc<dyn FieldStore>,
}

impl FieldModel {
    /// Create a field backed by no store
    pub fn new(config: FieldConfig) -> Self {
        Self::with_store(config, Arc::new(NoopStore))
    }

    pub fn with_store(config: FieldConfig, store: Arc<dyn FieldStore>) -> Self {
        FieldModel {
            state: Arc::new(FieldState::new(&config)),
            tracker: DirtyTracker::new(),
            store,
        }
    }

    /// Replace the dirty tracker (e.g. with a custom deep-inspect set)
    pub fn with_tracker(mut self, tracker: DirtyTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn path(&self) -> &str {
        &self.state.path
    }

    pub fn is_array_list(&self) -> bool {
        self.state.is_array_list()
    }

    /// Current snapshot without re-derivation
    pub fn snapshot(&self) -> Arc<FieldState> {
        Arc::clone(&self.state)
    }

    /// Current snapshot, refreshed from the store once initialized.
    ///
    /// If the externally-held value drifted from the cached one, the cache
    /// is updated and the store is told through
    /// [`FieldStore::uncontrolled_value_changed`]. This never runs a commit.
    /// Updating the cache is why a read needs `&mut self`; use
    /// [`FieldModel::snapshot`] for a shared, pure read.
    pub fn read(&mut self) -> Arc<FieldState> {
        if self.state.initialized {
            self.rederive();
        }
        self.snapshot()
    }

    fn rederive(&mut self) {
        let external_value = self
            .store
            .get_value(&self.state.name)
            .filter(|value| !deep_equal(value, &self.state.value));
        let external_initial = if is_valid(&self.state.initial_value) {
            None
        } else {
            self.store
                .get_initial_value(&self.state.name)
                .filter(|initial| !deep_equal(initial, &self.state.initial_value))
        };

        if external_value.is_none() && external_initial.is_none() {
            return;
        }

        let state = Arc::make_mut(&mut self.state);
        if let Some(initial) = external_initial {
            state.put_initial_value(initial);
        }
        let drifted = external_value.is_some();
        if let Some(value) = external_value {
            state.put_value(value);
        }
        state.refresh_pristine();

        if drifted {
            debug!(field = %state.name, "external value drifted from cache");
            self.store.uncontrolled_value_changed(&state.name);
        }
    }

    /// Apply one partial mutation atomically.
    ///
    /// A mutation that changes nothing leaves the snapshot (and its `Arc`)
    /// untouched and calls no store callbacks.
    pub fn commit(&mut self, mutation: FieldMutation) {
        let mut dirty = self.tracker.diff(&self.state, &mutation);
        if !dirty.any() {
            debug!(field = %self.state.name, "skipping no-op commit");
            return;
        }
        debug!(
            field = %self.state.name,
            dirty = ?dirty.dirty_properties(),
            "committing field mutation"
        );

        let previous = Arc::clone(&self.state);
        let mut draft = FieldState::clone(&previous);
        draft.assign(&mutation, &dirty);

        let mut ctx = CommitContext {
            previous: previous.as_ref(),
            mutation: &mutation,
            dirty: &mut dirty,
            store: self.store.as_ref(),
        };
        reconcile(&mut draft, &mut ctx);

        self.state = Arc::new(draft);
    }

    /// Move one element of an array value, carrying its item tag along.
    ///
    /// The reordered array is committed like any value mutation, so the
    /// store sees it and `modified`/`pristine` follow. Non-array values and
    /// out-of-range indexes leave the field untouched.
    pub fn move_item(&mut self, from: usize, to: usize) {
        let mut reordered = FieldState::clone(&self.state);
        if !reordered.reorder_value(from, to) {
            return;
        }
        let Some(items) = reordered.value.clone() else {
            return;
        };
        debug!(field = %reordered.name, from, to, "moving list item");
        self.state = Arc::new(reordered);
        self.commit(FieldMutation::new().value(items));
    }

    /// Parse a JSON mutation and commit it
    pub fn commit_json(&mut self, json: &str) -> FormStateResult<()> {
        let mutation = FieldMutation::from_json(json)?;
        self.commit(mutation);
        Ok(())
    }
}
