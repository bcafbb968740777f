//! End-to-end behavior of a field model through commits and reads

use std::sync::Arc;

use formstate_core::{FormEditable, Rule};
use formstate_engine::{FieldConfig, FieldModel, FieldMutation, MemoryStore, StoreCall};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn model_with_store(config: FieldConfig) -> (FieldModel, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let model = FieldModel::with_store(config, store.clone());
    (model, store)
}

#[test]
fn test_empty_commit_is_idempotent() {
    let (mut model, store) = model_with_store(FieldConfig::new("name"));
    model.commit(FieldMutation::new().value("x"));
    store.clear_calls();

    let before = model.snapshot();
    model.commit(FieldMutation::new());
    model.commit(FieldMutation::new());

    assert!(Arc::ptr_eq(&before, &model.snapshot()));
    assert_eq!(store.call_count(), 0);
}

#[test]
fn test_value_and_values_stay_in_step() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));

    model.commit(FieldMutation::new().value("a"));
    let state = model.snapshot();
    assert_eq!(state.value, state.values[0]);

    model.commit(FieldMutation::new().values([json!("b"), json!({"extra": true})]));
    let state = model.snapshot();
    assert_eq!(state.value, Some(json!("b")));
    assert_eq!(state.value, state.values[0]);
    assert_eq!(state.values.len(), 2);

    model.commit(FieldMutation::new().clear_value());
    let state = model.snapshot();
    assert_eq!(state.value, None);
    assert_eq!(state.values[0], None);
    assert!(state.modified);
}

#[test]
fn test_message_concatenation_order() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));

    model.commit(
        FieldMutation::new()
            .effect_errors(["effect"])
            .rule_errors(["rule"])
            .warnings(["w-effect"])
            .rule_warnings(["w-rule", ""]),
    );

    let state = model.snapshot();
    assert_eq!(state.errors, vec!["rule", "effect"]);
    assert_eq!(state.warnings, vec!["w-rule", "w-effect"]);
    assert!(state.invalid);
    assert!(!state.valid);

    model.commit(FieldMutation::new().rule_errors(Vec::<String>::new()).effect_errors([""]));
    let state = model.snapshot();
    assert!(state.errors.is_empty());
    assert!(state.valid);
}

#[test]
fn test_pristine_tracks_initial_value() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));

    model.commit(FieldMutation::new().initial_value(json!({"a": [1]})));
    assert!(!model.snapshot().pristine);

    model.commit(FieldMutation::new().value(json!({"a": [1]})));
    assert!(model.snapshot().pristine);

    model.commit(FieldMutation::new().value(json!({"a": [2]})));
    assert!(!model.snapshot().pristine);
}

#[test]
fn test_required_rules_round_trip() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));

    model.commit(FieldMutation::new().required(true));
    assert_eq!(model.snapshot().rules, vec![Rule::required(true)]);

    model.commit(FieldMutation::new().rules(vec![Rule::new()
        .with("required", json!(false))
        .with("message", json!("x"))]));
    assert!(!model.snapshot().required);
}

#[test]
fn test_required_rewrites_two_key_message_rule() {
    // A bare {required, message} pair is rewritten like any richer entry.
    let (mut model, _) = model_with_store(FieldConfig::new("name"));
    model.commit(FieldMutation::new().rules(vec![Rule::new()
        .with("required", json!(false))
        .with("message", json!("please fill"))]));

    model.commit(FieldMutation::new().required(true));

    let rules = &model.snapshot().rules;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].required_flag(), Some(true));
    assert_eq!(rules[0].message(), Some(&json!("please fill")));
}

#[test]
fn test_hide_show_round_trip() {
    let (mut model, store) = model_with_store(FieldConfig::new("qty"));
    model.commit(FieldMutation::new().value(5));

    model.commit(FieldMutation::new().visible(false));
    let state = model.snapshot();
    assert_eq!(state.value, None);
    assert_eq!(state.visible_cache_value, Some(json!(5)));
    assert_eq!(store.value("qty"), None);

    model.commit(FieldMutation::new().visible(true));
    let state = model.snapshot();
    assert_eq!(state.value, Some(json!(5)));
    assert_eq!(state.values[0], Some(json!(5)));
    assert_eq!(store.value("qty"), Some(json!(5)));
}

#[test]
fn test_remove_on_hide_survives_double_hide() {
    let (mut model, store) = model_with_store(FieldConfig::new("qty").node_path("form.qty"));
    store.mark_removable("form.qty");
    model.commit(FieldMutation::new().value(7).mounted(true));

    model.commit(FieldMutation::new().visible(false));
    model.commit(FieldMutation::new().unmounted(true));
    let state = model.snapshot();
    assert_eq!(state.value, None);
    assert_eq!(state.visible_cache_value, Some(json!(7)));
    assert!(!state.mounted);

    // still unmounted, so still hidden
    model.commit(FieldMutation::new().visible(true));
    assert_eq!(model.snapshot().value, None);

    model.commit(FieldMutation::new().mounted(true));
    let state = model.snapshot();
    assert!(!state.unmounted);
    assert_eq!(state.value, Some(json!(7)));
}

#[test]
fn test_unmount_keeps_value_without_store_consent() {
    let (mut model, store) = model_with_store(FieldConfig::new("qty").node_path("form.qty"));
    model.commit(FieldMutation::new().value(7).mounted(true));
    store.clear_calls();

    model.commit(FieldMutation::new().unmounted(true));
    assert_eq!(model.snapshot().value, Some(json!(7)));
    assert_eq!(store.call_count(), 0);
}

#[test]
fn test_array_list_tags_are_stable() {
    let (mut model, _) = model_with_store(FieldConfig::new("contacts").data_type("array"));
    assert!(model.is_array_list());

    model.commit(FieldMutation::new().value(json!([{"n": 1}, {"n": 2}])));
    let state = model.snapshot();
    assert_eq!(state.value_tag(0), Some("contacts.0"));
    assert_eq!(state.value_tag(1), Some("contacts.1"));

    model.commit(FieldMutation::new().value(json!([{"n": 1}, {"n": 2}, {"n": 3}])));
    let state = model.snapshot();
    assert_eq!(state.value_tag(0), Some("contacts.0"));
    assert_eq!(state.value_tag(2), Some("contacts.2"));

    model.commit(FieldMutation::new().initial_value(json!([{"n": 0}])));
    assert_eq!(model.snapshot().initial_value_tag(0), Some("contacts.0"));
}

#[test]
fn test_editability_precedence() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));

    model.commit(FieldMutation::new().form_editable(true).editable(false));
    let state = model.snapshot();
    assert_eq!(state.self_editable, Some(false));
    assert!(!state.editable);

    model.commit(FieldMutation::new().clear_editable());
    let state = model.snapshot();
    assert_eq!(state.self_editable, None);
    assert!(state.editable);

    model.commit(FieldMutation::new().form_editable(FormEditable::computed(|name| {
        name.starts_with("readonly")
    })));
    assert!(!model.snapshot().editable);
}

#[test]
fn test_mount_unmount_complement() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));

    model.commit(FieldMutation::new().mounted(true));
    let state = model.snapshot();
    assert!(state.mounted);
    assert!(!state.unmounted);

    model.commit(FieldMutation::new().unmounted(true));
    let state = model.snapshot();
    assert!(!state.mounted);
    assert!(state.unmounted);
}

#[test]
fn test_first_mount_default_fill() {
    let (mut model, store) = model_with_store(FieldConfig::new("city"));
    model.commit(FieldMutation::new().initial_value("Oslo"));
    store.clear_calls();

    model.commit(FieldMutation::new().initialized(true));

    let state = model.snapshot();
    assert_eq!(state.value, Some(json!("Oslo")));
    assert!(state.pristine);
    assert_eq!(
        store.calls(),
        vec![StoreCall::SetValue {
            name: "city".to_string(),
            value: Some(json!("Oslo"))
        }]
    );
}

#[test]
fn test_uncontrolled_drift_notifies_once() {
    init_tracing();
    let store = Arc::new(MemoryStore::controlled());
    let mut model = FieldModel::with_store(FieldConfig::new("city"), store.clone());
    model.commit(FieldMutation::new().initialized(true).initial_value("Oslo"));
    store.clear_calls();

    store.put_value("city", Some(json!("Bergen")));
    let state = model.read();
    assert_eq!(state.value, Some(json!("Bergen")));
    assert!(!state.pristine);

    model.read();
    let drift_calls = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::UncontrolledValueChanged { .. }))
        .count();
    assert_eq!(drift_calls, 1);
}

#[test]
fn test_json_mutations() {
    let (mut model, _) = model_with_store(FieldConfig::new("age"));

    model
        .commit_json(r#"{"value": 30, "rules": {"required": true, "message": "age?"}}"#)
        .unwrap();
    let state = model.snapshot();
    assert_eq!(state.value, Some(json!(30)));
    assert!(state.required);

    model.commit_json(r#"{"props": null, "validating": true}"#).unwrap();
    let state = model.snapshot();
    assert!(state.props.is_empty());
    assert!(state.loading);

    assert!(model.commit_json(r#"{"valid": false}"#).is_err());
}

#[test]
fn test_unmount_clears_value_written_while_invisible() {
    let (mut model, store) = model_with_store(FieldConfig::new("q").node_path("form.q"));
    store.mark_removable("form.q");
    model.commit(FieldMutation::new().value(7).mounted(true));
    model.commit(FieldMutation::new().visible(false));
    model.commit(FieldMutation::new().value(9));
    store.clear_calls();

    model.commit(FieldMutation::new().unmounted(true));
    let state = model.snapshot();
    assert_eq!(state.value, None);
    assert_eq!(state.visible_cache_value, Some(json!(9)));
    assert_eq!(
        store.calls(),
        vec![StoreCall::SetValue {
            name: "q".to_string(),
            value: None
        }]
    );

    model.commit(FieldMutation::new().visible(true).mounted(true));
    assert_eq!(model.snapshot().value, Some(json!(9)));
}

#[test]
fn test_reordered_list_keeps_tags() {
    let (mut model, _) = model_with_store(FieldConfig::new("f").data_type("array"));
    model.commit(FieldMutation::new().value(json!([{"id": 1}, {"id": 2}])));

    model.commit(FieldMutation::new().value(json!([{"id": 2}, {"id": 1}])));
    let state = model.snapshot();
    assert_eq!(state.value_tag(0), Some("f.1"));
    assert_eq!(state.value_tag(1), Some("f.0"));

    model.commit(FieldMutation::new().value(json!([{"id": 2}, {"id": 1}, {"id": 3}])));
    model.move_item(2, 0);
    let state = model.snapshot();
    assert_eq!(state.value, Some(json!([{"id": 3}, {"id": 2}, {"id": 1}])));
    assert_eq!(state.value_tag(0), Some("f.2"));
    assert_eq!(state.value_tag(1), Some("f.1"));
    assert_eq!(state.value_tag(2), Some("f.0"));
}

#[test]
fn test_clearing_absent_override_keeps_messages() {
    let (mut model, _) = model_with_store(FieldConfig::new("name"));
    model.commit(FieldMutation::new().errors(["taken"]));

    model.commit(FieldMutation::new().clear_editable());
    let state = model.snapshot();
    assert_eq!(state.errors, vec!["taken"]);
    assert!(state.editable);
}
