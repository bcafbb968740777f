//! Field Mutation Fuzzer - Randomized commit sequences against field models
//!
//! Drives a set of fields through seeded random mutations, interleaved with
//! external value drift and reads, and checks after every step:
//! - `value` leads `values`
//! - Message channels concatenate rule-first
//! - Validity and pristine flags agree with their sources
//! - Mount flags stay complementary once either was touched
//! - Hidden remove-on-hide fields hold no value
//! - No-op commits keep the snapshot
//! - Array-list tags cover every element

use std::sync::Arc;

use formstate_engine::{
    DirtyTracker, FieldConfig, FieldModel, FieldMutation, FieldState, MemoryStore, Property,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of independent fields
    pub field_count: usize,
    /// Number of commits per field
    pub commit_count: usize,
    /// Upper bound on properties touched by one mutation
    pub max_ops: usize,
    /// Share of fields declared as array lists
    pub array_prob: f64,
    /// Share of fields whose store asks for removal on unmount
    pub removable_prob: f64,
    /// Probability of external drift plus a read after a commit
    pub drift_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            field_count: 8,
            commit_count: 500,
            max_ops: 5,
            array_prob: 0.25,
            removable_prob: 0.5,
            drift_prob: 0.1,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            field_count: 3,
            commit_count: 100,
            max_ops: 3,
            array_prob: 0.3,
            removable_prob: 0.5,
            drift_prob: 0.0,
            seed: 42,
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            field_count: 32,
            commit_count: 5000,
            max_ops: 8,
            array_prob: 0.3,
            removable_prob: 0.5,
            drift_prob: 0.2,
            seed: 42,
        }
    }
}

/// Invariant broken by a snapshot
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Violation {
    #[error("field {field} step {step}: value does not lead values")]
    ValueSlot { field: String, step: u64 },

    #[error("field {field} step {step}: {channel} is not rule messages followed by effect messages")]
    MessageOrder {
        field: String,
        step: u64,
        channel: &'static str,
    },

    #[error("field {field} step {step}: empty message survived normalization")]
    EmptyMessage { field: String, step: u64 },

    #[error("field {field} step {step}: valid/invalid disagree with errors")]
    Validity { field: String, step: u64 },

    #[error("field {field} step {step}: pristine disagrees with initial value")]
    Pristine { field: String, step: u64 },

    #[error("field {field} step {step}: mounted and unmounted are equal")]
    MountComplement { field: String, step: u64 },

    #[error("field {field} step {step}: editable ignores own flag")]
    Editable { field: String, step: u64 },

    #[error("field {field} step {step}: no-op commit replaced the snapshot")]
    NoopReplaced { field: String, step: u64 },

    #[error("field {field} step {step}: array element without tag")]
    MissingTag { field: String, step: u64 },

    #[error("field {field} step {step}: hidden field kept its value")]
    HiddenValue { field: String, step: u64 },
}

/// Fuzzing result
#[derive(Debug, Default)]
pub struct FuzzReport {
    pub commits: u64,
    pub noop_commits: u64,
    pub reads: u64,
    pub violations: Vec<Violation>,
}

impl FuzzReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Fuzzer state for a single field
pub struct FuzzField {
    pub model: FieldModel,
    pub store: Arc<MemoryStore>,
    removable: bool,
    mount_touched: bool,
}

impl FuzzField {
    pub fn new(config: FieldConfig, removable: bool) -> Self {
        let store = Arc::new(MemoryStore::controlled());
        if removable {
            store.mark_removable(&config.path());
        }
        FuzzField {
            model: FieldModel::with_store(config, store.clone()),
            store,
            removable,
            mount_touched: false,
        }
    }
}

/// Field mutation fuzzer
pub struct MutationFuzzer {
    config: FuzzerConfig,
    fields: Vec<FuzzField>,
    tracker: DirtyTracker,
    rng: StdRng,
    step: u64,
}

impl MutationFuzzer {
    /// Create a new fuzzer
    pub fn new(config: FuzzerConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let fields = (0..config.field_count)
            .map(|i| {
                let mut field = FieldConfig::new(format!("field{}", i)).node_path(format!("form.field{}", i));
                if rng.gen::<f64>() < config.array_prob {
                    field = field.data_type("array");
                }
                let removable = rng.gen::<f64>() < config.removable_prob;
                FuzzField::new(field, removable)
            })
            .collect();

        MutationFuzzer {
            config,
            fields,
            tracker: DirtyTracker::new(),
            rng,
            step: 0,
        }
    }

    pub fn fields(&self) -> &[FuzzField] {
        &self.fields
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> FuzzReport {
        let mut report = FuzzReport::new();

        for _ in 0..self.config.commit_count {
            for index in 0..self.fields.len() {
                self.step += 1;
                let mutation = self.generate_mutation();
                self.commit(index, mutation, &mut report);

                if self.rng.gen::<f64>() < self.config.drift_prob {
                    self.drift(index, &mut report);
                }
            }
        }

        info!(
            commits = report.commits,
            noop_commits = report.noop_commits,
            reads = report.reads,
            violations = report.violations.len(),
            "fuzz run finished"
        );
        report
    }

    fn commit(&mut self, index: usize, mutation: FieldMutation, report: &mut FuzzReport) {
        let step = self.step;
        let field = &mut self.fields[index];

        let before = field.model.snapshot();
        let dirty = self.tracker.diff(&before, &mutation);
        field.mount_touched |= dirty.is_dirty(Property::Mounted) || dirty.is_dirty(Property::Unmounted);

        field.model.commit(mutation);
        let after = field.model.snapshot();
        report.commits += 1;

        if !dirty.any() {
            report.noop_commits += 1;
            if !Arc::ptr_eq(&before, &after) {
                report.violations.push(Violation::NoopReplaced {
                    field: after.name.clone(),
                    step,
                });
            }
        }

        let mut violations = properties::check(&after, field.mount_touched, step);
        let hide_trigger = dirty.is_dirty(Property::Visible)
            || dirty.is_dirty(Property::Mounted)
            || dirty.is_dirty(Property::Unmounted);
        if field.removable && hide_trigger && !properties::hidden_value_cleared(&after) {
            violations.push(Violation::HiddenValue {
                field: after.name.clone(),
                step,
            });
        }
        for violation in &violations {
            debug!(%violation, "invariant violated");
        }
        report.violations.extend(violations);
    }

    /// Change the value behind the field's back, then read it
    fn drift(&mut self, index: usize, report: &mut FuzzReport) {
        let value = self.generate_value();
        let step = self.step;
        let field = &mut self.fields[index];

        let name = field.model.name().to_string();
        field.store.put_value(&name, value);
        let state = field.model.read();
        report.reads += 1;

        report
            .violations
            .extend(properties::check(&state, field.mount_touched, step));
    }

    fn generate_value(&mut self) -> Option<Value> {
        match self.rng.gen_range(0..5) {
            0 => None,
            1 => Some(json!(self.rng.gen_range(0..4))),
            2 => Some(json!(format!("s{}", self.rng.gen_range(0..3)))),
            3 => Some(json!({ "n": [self.rng.gen_range(0..3)] })),
            _ => {
                let len = self.rng.gen_range(0..4);
                let items: Vec<Value> = (0..len)
                    .map(|i| {
                        if self.rng.gen_bool(0.7) {
                            json!({ "id": i })
                        } else {
                            json!(i)
                        }
                    })
                    .collect();
                Some(Value::Array(items))
            }
        }
    }

    fn generate_messages(&mut self) -> Vec<String> {
        let len = self.rng.gen_range(0..3);
        (0..len)
            .map(|_| match self.rng.gen_range(0..4) {
                0 => String::new(),
                n => format!("m{}", n),
            })
            .collect()
    }

    /// Generate a random mutation
    fn generate_mutation(&mut self) -> FieldMutation {
        let ops = self.rng.gen_range(0..=self.config.max_ops);
        let mut mutation = FieldMutation::new();

        for _ in 0..ops {
            mutation = match self.rng.gen_range(0..17) {
                0 => match self.generate_value() {
                    Some(value) => mutation.value(value),
                    None => mutation.clear_value(),
                },
                1 => {
                    let len = self.rng.gen_range(0..3);
                    let values: Vec<Option<Value>> = (0..len).map(|_| self.generate_value()).collect();
                    mutation.values(values)
                }
                2 => match self.generate_value() {
                    Some(value) => mutation.initial_value(value),
                    None => mutation.clear_initial_value(),
                },
                3 => mutation.errors(self.generate_messages()),
                4 => mutation.rule_errors(self.generate_messages()),
                5 => mutation.effect_warnings(self.generate_messages()),
                6 => mutation.rule_warnings(self.generate_messages()),
                7 => {
                    if self.rng.gen_bool(0.3) {
                        mutation.clear_editable()
                    } else {
                        mutation.editable(self.rng.gen())
                    }
                }
                8 => mutation.form_editable(self.rng.gen::<bool>()),
                9 => mutation.required(self.rng.gen()),
                10 => mutation.visible(self.rng.gen()),
                11 => mutation.display(self.rng.gen_bool(0.8)),
                12 => mutation.mounted(self.rng.gen()),
                13 => mutation.unmounted(self.rng.gen()),
                14 => mutation.validating(self.rng.gen()),
                15 => mutation.initialized(self.rng.gen_bool(0.7)),
                _ => mutation.props(json!({ "size": self.rng.gen_range(0..3) })),
            };
        }

        mutation
    }
}

/// Snapshot invariants
pub mod properties {
    use super::*;
    use formstate_core::{deep_equal, is_valid};

    /// Property: `value` is always `values[0]`
    pub fn value_leads_values(state: &FieldState) -> bool {
        state.values.first() == Some(&state.value)
    }

    /// Property: aggregated channels are rule messages then effect messages
    pub fn messages_concatenated(aggregate: &[String], rule: &[String], effect: &[String]) -> bool {
        aggregate.len() == rule.len() + effect.len()
            && aggregate[..rule.len()] == *rule
            && aggregate[rule.len()..] == *effect
    }

    /// Property: validity follows the error channel
    pub fn validity_consistent(state: &FieldState) -> bool {
        state.invalid == !state.errors.is_empty() && state.valid == !state.invalid
    }

    /// Property: pristine means value equals initial value
    pub fn pristine_consistent(state: &FieldState) -> bool {
        state.pristine == deep_equal(&state.initial_value, &state.value)
    }

    /// Property: every object element of an array-list value carries a tag
    pub fn array_items_tagged(state: &FieldState) -> bool {
        if !state.is_array_list() {
            return true;
        }
        match &state.value {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .all(|(i, item)| !item.is_object() || state.value_tag(i).is_some()),
            _ => true,
        }
    }

    /// Property: a hidden remove-on-hide field holds no value
    pub fn hidden_value_cleared(state: &FieldState) -> bool {
        let hidden = !state.visible || state.unmounted;
        !(hidden && state.display && state.unmount_remove_value && is_valid(&state.value))
    }

    /// Check every snapshot invariant
    pub fn check(state: &FieldState, mount_touched: bool, step: u64) -> Vec<Violation> {
        let field = || state.name.clone();
        let mut violations = Vec::new();

        if !value_leads_values(state) {
            violations.push(Violation::ValueSlot { field: field(), step });
        }
        if !messages_concatenated(&state.errors, &state.rule_errors, &state.effect_errors) {
            violations.push(Violation::MessageOrder {
                field: field(),
                step,
                channel: "errors",
            });
        }
        if !messages_concatenated(&state.warnings, &state.rule_warnings, &state.effect_warnings) {
            violations.push(Violation::MessageOrder {
                field: field(),
                step,
                channel: "warnings",
            });
        }
        if state.errors.iter().chain(&state.warnings).any(|m| m.is_empty()) {
            violations.push(Violation::EmptyMessage { field: field(), step });
        }
        if !validity_consistent(state) {
            violations.push(Violation::Validity { field: field(), step });
        }
        if !pristine_consistent(state) {
            violations.push(Violation::Pristine { field: field(), step });
        }
        if mount_touched && state.mounted == state.unmounted {
            violations.push(Violation::MountComplement { field: field(), step });
        }
        if state.self_editable.is_some_and(|own| own != state.editable) {
            violations.push(Violation::Editable { field: field(), step });
        }
        if !array_items_tagged(state) {
            violations.push(Violation::MissingTag { field: field(), step });
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzer_light() {
        let mut fuzzer = MutationFuzzer::new(FuzzerConfig::light());
        let report = fuzzer.run();

        assert_eq!(report.commits, 300);
        assert!(report.is_valid(), "violations: {:?}", report.violations);
    }

    #[test]
    fn test_fuzzer_default() {
        let mut fuzzer = MutationFuzzer::new(FuzzerConfig::default());
        let report = fuzzer.run();

        assert!(report.reads > 0);
        assert!(report.noop_commits > 0);
        assert!(report.is_valid(), "violations: {:?}", report.violations);
    }

    #[test]
    fn test_fuzzer_is_deterministic() {
        let config = FuzzerConfig {
            commit_count: 50,
            seed: 7,
            ..FuzzerConfig::default()
        };
        let a = MutationFuzzer::new(config.clone()).run();
        let b = MutationFuzzer::new(config).run();

        assert_eq!(a.commits, b.commits);
        assert_eq!(a.noop_commits, b.noop_commits);
        assert_eq!(a.reads, b.reads);
    }

    #[test]
    fn test_messages_concatenated() {
        let rule = vec!["r".to_string()];
        let effect = vec!["e".to_string()];

        assert!(properties::messages_concatenated(
            &["r".to_string(), "e".to_string()],
            &rule,
            &effect
        ));
        assert!(!properties::messages_concatenated(
            &["e".to_string(), "r".to_string()],
            &rule,
            &effect
        ));
        assert!(properties::messages_concatenated(&[], &[], &[]));
    }

    #[test]
    fn test_check_reports_broken_snapshot() {
        let mut state = FieldState::new(&FieldConfig::new("broken"));
        assert!(properties::check(&state, false, 1).is_empty());

        state.invalid = true;
        state.pristine = false;
        let violations = properties::check(&state, true, 1);

        assert!(violations.contains(&Violation::Validity {
            field: "broken".to_string(),
            step: 1
        }));
        assert!(violations.contains(&Violation::Pristine {
            field: "broken".to_string(),
            step: 1
        }));
        assert!(violations.contains(&Violation::MountComplement {
            field: "broken".to_string(),
            step: 1
        }));
    }

    #[test]
    fn test_violation_message() {
        let violation = Violation::MessageOrder {
            field: "a".to_string(),
            step: 3,
            channel: "errors",
        };
        assert_eq!(
            violation.to_string(),
            "field a step 3: errors is not rule messages followed by effect messages"
        );
    }

    #[test]
    fn test_hidden_value_cleared() {
        let mut state = FieldState::new(&FieldConfig::new("q"));
        state.values = vec![Some(json!(9))];
        state.value = Some(json!(9));
        assert!(properties::hidden_value_cleared(&state));

        state.unmounted = true;
        assert!(!properties::hidden_value_cleared(&state));

        state.display = false;
        assert!(properties::hidden_value_cleared(&state));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        #[test]
        fn test_any_seed_holds_invariants(seed in proptest::prelude::any::<u64>()) {
            let config = FuzzerConfig {
                commit_count: 40,
                drift_prob: 0.2,
                seed,
                ..FuzzerConfig::light()
            };
            let report = MutationFuzzer::new(config).run();
            proptest::prop_assert!(report.is_valid(), "violations: {:?}", report.violations);
        }
    }
}
