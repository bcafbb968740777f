//! Partial field mutations
//!
//! Every property is optional: `None` means "not touched". Properties that
//! may legitimately become unset carry a second `Option` layer, so
//! `Some(None)` means "set to unset".

use formstate_core::{
    messages_from_value, rules_from_value, FieldValue, FormEditable, FormStateError,
    FormStateResult, Rule,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One partial mutation of a field's state
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldMutation {
    #[serde(default, deserialize_with = "present_value")]
    pub value: Option<FieldValue>,
    #[serde(default, deserialize_with = "loose_values")]
    pub values: Option<Vec<FieldValue>>,
    #[serde(default, deserialize_with = "present_value")]
    pub initial_value: Option<FieldValue>,

    #[serde(default, deserialize_with = "loose_messages")]
    pub errors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "loose_messages")]
    pub warnings: Option<Vec<String>>,
    #[serde(default, deserialize_with = "loose_messages")]
    pub effect_errors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "loose_messages")]
    pub effect_warnings: Option<Vec<String>>,
    #[serde(default, deserialize_with = "loose_messages")]
    pub rule_errors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "loose_messages")]
    pub rule_warnings: Option<Vec<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub editable: Option<Option<bool>>,
    #[serde(default, deserialize_with = "nullable")]
    pub self_editable: Option<Option<bool>>,
    #[serde(default, deserialize_with = "form_editable")]
    pub form_editable: Option<Option<FormEditable>>,

    pub required: Option<bool>,
    #[serde(default, deserialize_with = "loose_rules")]
    pub rules: Option<Vec<Rule>>,

    pub visible: Option<bool>,
    pub display: Option<bool>,
    #[serde(default, deserialize_with = "present_value")]
    pub visible_cache_value: Option<FieldValue>,
    pub mounted: Option<bool>,
    pub unmounted: Option<bool>,
    pub unmount_remove_value: Option<bool>,

    #[serde(default, deserialize_with = "nullable")]
    pub validating: Option<Option<bool>>,
    pub loading: Option<bool>,
    #[serde(default, deserialize_with = "present_json")]
    pub props: Option<Value>,
    pub initialized: Option<bool>,
}

impl FieldMutation {
    pub fn new() -> Self {
        FieldMutation::default()
    }

    /// Parse a mutation from a JSON object with camelCase keys
    pub fn from_json(json: &str) -> FormStateResult<Self> {
        serde_json::from_str(json).map_err(FormStateError::InvalidMutation)
    }

    pub fn from_value(value: Value) -> FormStateResult<Self> {
        serde_json::from_value(value).map_err(FormStateError::InvalidMutation)
    }

    /// Check if the mutation touches nothing
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.values.is_none()
            && self.initial_value.is_none()
            && self.errors.is_none()
            && self.warnings.is_none()
            && self.effect_errors.is_none()
            && self.effect_warnings.is_none()
            && self.rule_errors.is_none()
            && self.rule_warnings.is_none()
            && self.editable.is_none()
            && self.self_editable.is_none()
            && self.form_editable.is_none()
            && self.required.is_none()
            && self.rules.is_none()
            && self.visible.is_none()
            && self.display.is_none()
            && self.visible_cache_value.is_none()
            && self.mounted.is_none()
            && self.unmounted.is_none()
            && self.unmount_remove_value.is_none()
            && self.validating.is_none()
            && self.loading.is_none()
            && self.props.is_none()
            && self.initialized.is_none()
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(Some(value.into()));
        self
    }

    pub fn clear_value(mut self) -> Self {
        self.value = Some(None);
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(Some(value.into()));
        self
    }

    pub fn clear_initial_value(mut self) -> Self {
        self.initial_value = Some(None);
        self
    }

    pub fn errors<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn warnings<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn effect_errors<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effect_errors = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn effect_warnings<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effect_warnings = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn rule_errors<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_errors = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn rule_warnings<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_warnings = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(Some(editable));
        self
    }

    /// Drop the field's own editability override
    pub fn clear_editable(mut self) -> Self {
        self.editable = Some(None);
        self
    }

    pub fn self_editable(mut self, editable: bool) -> Self {
        self.self_editable = Some(Some(editable));
        self
    }

    pub fn form_editable(mut self, editable: impl Into<FormEditable>) -> Self {
        self.form_editable = Some(Some(editable.into()));
        self
    }

    pub fn clear_form_editable(mut self) -> Self {
        self.form_editable = Some(None);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules = Some(rules.into_iter().collect());
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = Some(display);
        self
    }

    pub fn visible_cache_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.visible_cache_value = Some(value.into());
        self
    }

    pub fn mounted(mut self, mounted: bool) -> Self {
        self.mounted = Some(mounted);
        self
    }

    pub fn unmounted(mut self, unmounted: bool) -> Self {
        self.unmounted = Some(unmounted);
        self
    }

    pub fn unmount_remove_value(mut self, remove: bool) -> Self {
        self.unmount_remove_value = Some(remove);
        self
    }

    pub fn validating(mut self, validating: bool) -> Self {
        self.validating = Some(Some(validating));
        self
    }

    pub fn clear_validating(mut self) -> Self {
        self.validating = Some(None);
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn props(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }

    pub fn initialized(mut self, initialized: bool) -> Self {
        self.initialized = Some(initialized);
        self
    }
}

// JSON cannot spell "unset", so a present key always carries a value,
// including an explicit null.
fn present_value<'de, D>(deserializer: D) -> Result<Option<FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(Some(v)))
}

fn present_json<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn loose_messages<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(messages_from_value(&v)))
}

fn loose_rules<'de, D>(deserializer: D) -> Result<Option<Vec<Rule>>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(rules_from_value(v)))
}

fn loose_values<'de, D>(deserializer: D) -> Result<Option<Vec<FieldValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| {
        Some(match v {
            Value::Array(items) => items.into_iter().map(Some).collect(),
            single => vec![Some(single)],
        })
    })
}

fn form_editable<'de, D>(deserializer: D) -> Result<Option<Option<FormEditable>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|flag| Some(flag.map(FormEditable::Constant)))
}
