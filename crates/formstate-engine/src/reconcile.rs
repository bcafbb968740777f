//! Field state reconciliation pipeline
//!
//! A commit runs five stages over one working copy, in a fixed order:
//! 1. Messages - normalize message channels, rebuild `errors`/`warnings`
//! 2. Editability - resolve the effective `editable` flag
//! 3. Value - value slots, default fill, externalization, `pristine`
//! 4. Side effects - loading, stale messages, props, mount, hide/show, validity
//! 5. Rules - keep `rules` and `required` in sync
//!
//! Side effects read what stages 2 and 3 wrote; rules are independent and
//! run last.

use formstate_core::{is_valid, merge_channels, normalize_messages, Record, Rule};
use serde_json::Value;
use tracing::trace;

use crate::{DirtyMap, FieldMutation, FieldState, FieldStore, Property, ValueBridge};

/// Everything a stage may consult besides the working copy
pub struct CommitContext<'a> {
    /// Snapshot the commit started from
    pub previous: &'a FieldState,
    pub mutation: &'a FieldMutation,
    pub dirty: &'a mut DirtyMap,
    pub store: &'a dyn FieldStore,
}

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Messages,
    Editability,
    Value,
    SideEffects,
    Rules,
}

impl Stage {
    /// Evaluation order
    pub const PIPELINE: [Stage; 5] = [
        Stage::Messages,
        Stage::Editability,
        Stage::Value,
        Stage::SideEffects,
        Stage::Rules,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Messages => "messages",
            Stage::Editability => "editability",
            Stage::Value => "value",
            Stage::SideEffects => "side-effects",
            Stage::Rules => "rules",
        }
    }

    pub fn apply(self, draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
        match self {
            Stage::Messages => produce_messages(draft, ctx),
            Stage::Editability => produce_editable(draft, ctx),
            Stage::Value => produce_value(draft, ctx),
            Stage::SideEffects => produce_side_effects(draft, ctx),
            Stage::Rules => produce_rules(draft, ctx),
        }
    }
}

/// Run every stage over the working copy
pub fn reconcile(draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
    for stage in Stage::PIPELINE {
        trace!(field = %draft.name, stage = stage.name(), "running stage");
        stage.apply(draft, ctx);
    }
}

fn produce_messages(draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
    let m = ctx.mutation;
    let dirty = &*ctx.dirty;

    // Raw `errors`/`warnings` are shorthand for the effect channels; an
    // explicit effect channel in the same mutation wins.
    if let (true, Some(errors)) = (dirty.is_dirty(Property::Errors), &m.errors) {
        draft.effect_errors = normalize_messages(errors.iter().cloned());
    }
    if let (true, Some(warnings)) = (dirty.is_dirty(Property::Warnings), &m.warnings) {
        draft.effect_warnings = normalize_messages(warnings.iter().cloned());
    }
    if let (true, Some(errors)) = (dirty.is_dirty(Property::EffectErrors), &m.effect_errors) {
        draft.effect_errors = normalize_messages(errors.iter().cloned());
    }
    if let (true, Some(warnings)) = (dirty.is_dirty(Property::EffectWarnings), &m.effect_warnings) {
        draft.effect_warnings = normalize_messages(warnings.iter().cloned());
    }
    if let (true, Some(errors)) = (dirty.is_dirty(Property::RuleErrors), &m.rule_errors) {
        draft.rule_errors = normalize_messages(errors.iter().cloned());
    }
    if let (true, Some(warnings)) = (dirty.is_dirty(Property::RuleWarnings), &m.rule_warnings) {
        draft.rule_warnings = normalize_messages(warnings.iter().cloned());
    }

    draft.errors = merge_channels(&draft.rule_errors, &draft.effect_errors);
    draft.warnings = merge_channels(&draft.rule_warnings, &draft.effect_warnings);
}

fn produce_editable(draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
    if let (true, Some(editable)) = (ctx.dirty.is_dirty(Property::Editable), ctx.mutation.editable) {
        draft.self_editable = editable;
    }

    draft.editable = match (draft.self_editable, &draft.form_editable) {
        (Some(own), _) => own,
        (None, Some(form)) => form.resolve(&draft.name),
        (None, None) => true,
    };
}

fn produce_value(draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
    let m = ctx.mutation;

    let initial_changed = ctx.dirty.is_dirty(Property::InitialValue);
    if let (true, Some(initial)) = (initial_changed, &m.initial_value) {
        draft.put_initial_value(initial.clone());
    }

    if let (true, Some(values)) = (ctx.dirty.is_dirty(Property::Values), &m.values) {
        let mut values = values.clone();
        if values.is_empty() {
            values.push(None);
        }
        let first = values[0].clone();
        draft.values = values;
        draft.put_value(first);
        draft.modified = true;
    } else if let (true, Some(value)) = (ctx.dirty.is_dirty(Property::Value), &m.value) {
        draft.put_value(value.clone());
        draft.modified = true;
    }

    // First mount: an empty field adopts its initial value
    if ctx.dirty.is_dirty(Property::Initialized)
        && draft.initialized
        && !is_valid(&draft.value)
        && is_valid(&draft.initial_value)
    {
        trace!(field = %draft.name, "filling value from initial value");
        let initial = draft.initial_value.clone();
        draft.put_value(initial);
        ctx.dirty.set_dirty(Property::Value);
        ctx.dirty.set_dirty(Property::Values);
    }

    let bridge = ValueBridge::new(ctx.store);
    let value_changed = ctx.dirty.is_dirty(Property::Value) || ctx.dirty.is_dirty(Property::Values);
    if value_changed {
        bridge.externalize_value(draft);
    }
    if initial_changed {
        bridge.externalize_initial_value(draft);
    }

    if value_changed || initial_changed {
        draft.refresh_pristine();
    }
}

fn produce_side_effects(draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
    let dirty = &*ctx.dirty;

    if dirty.is_dirty(Property::Validating) {
        match draft.validating {
            Some(true) => draft.loading = true,
            Some(false) => draft.loading = false,
            None => {}
        }
    }

    // Editability or visibility changes invalidate earlier validation
    if dirty.is_dirty(Property::Editable)
        || dirty.is_dirty(Property::SelfEditable)
        || !draft.visible
        || draft.unmounted
    {
        clear_messages(draft);
    }

    if dirty.is_dirty(Property::Props) {
        draft.props = match &ctx.mutation.props {
            Some(Value::Object(props)) => props.clone(),
            _ => Record::new(),
        };
    }

    if dirty.is_dirty(Property::Mounted) {
        draft.unmounted = !draft.mounted;
    } else if dirty.is_dirty(Property::Unmounted) {
        draft.mounted = !draft.unmounted;
    }

    ValueBridge::new(ctx.store).sync_visibility(draft, ctx.previous, dirty);

    draft.invalid = !draft.errors.is_empty();
    draft.valid = !draft.invalid;
}

fn clear_messages(draft: &mut FieldState) {
    draft.errors.clear();
    draft.warnings.clear();
    draft.effect_errors.clear();
    draft.effect_warnings.clear();
    draft.rule_errors.clear();
    draft.rule_warnings.clear();
}

fn produce_rules(draft: &mut FieldState, ctx: &mut CommitContext<'_>) {
    if ctx.dirty.is_dirty(Property::Required) {
        let required = draft.required;
        if draft.rules.iter().any(Rule::declares_required) {
            draft.rules = draft
                .rules
                .iter()
                .map(|rule| rewrite_required(rule, required))
                .collect();
        } else {
            draft.rules.push(Rule::required(required));
        }
    } else if ctx.dirty.is_dirty(Property::Rules) {
        if let Some(required) = draft.rules.iter().find_map(Rule::required_flag) {
            draft.required = required;
        }
    }
}

/// Rewrite the `required` flag of one rule entry.
///
/// Entries pairing `required` with a `message` keep their message, whether
/// they are the bare two-key pair or carry extra keys; only the flag moves.
/// Entries without a `required` key pass through untouched.
fn rewrite_required(rule: &Rule, required: bool) -> Rule {
    if rule.declares_required() {
        rule.with_required(required)
    } else {
        rule.clone()
    }
}
