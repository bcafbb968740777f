//! Validation rule records
//!
//! A rule is an open record. The engine only cares about two keys:
//! `required` and `message`; everything else is carried through untouched
//! for the validator that eventually runs the rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{truthy, Comparable, Record};

pub const REQUIRED_KEY: &str = "required";
pub const MESSAGE_KEY: &str = "message";

/// One validation rule entry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule(pub Record);

impl Rule {
    pub fn new() -> Self {
        Rule(Record::new())
    }

    /// The `{required}` shorthand rule
    pub fn required(required: bool) -> Self {
        Rule::new().with(REQUIRED_KEY, Value::Bool(required))
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Check if the entry carries a `required` key at all
    pub fn declares_required(&self) -> bool {
        self.0.contains_key(REQUIRED_KEY)
    }

    /// The `required` flag, coerced to bool, if declared
    pub fn required_flag(&self) -> Option<bool> {
        self.0.get(REQUIRED_KEY).map(truthy)
    }

    pub fn message(&self) -> Option<&Value> {
        self.0.get(MESSAGE_KEY)
    }

    pub fn has_message(&self) -> bool {
        self.message().map(truthy).unwrap_or(false)
    }

    /// Number of keys in the record
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this rule with `required` overwritten
    pub fn with_required(&self, required: bool) -> Rule {
        let mut rule = self.clone();
        rule.0.insert(REQUIRED_KEY.to_string(), Value::Bool(required));
        rule
    }
}

impl From<Record> for Rule {
    fn from(record: Record) -> Self {
        Rule(record)
    }
}

impl Comparable for Rule {
    fn strict_eq(&self, _other: &Self) -> bool {
        false
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self == other
    }
}

/// Coerce loose rule input into a sequence.
///
/// A single object becomes a one-element list, non-object array entries are
/// dropped, anything else yields an empty list.
pub fn rules_from_value(value: Value) -> Vec<Rule> {
    match value {
        Value::Object(record) => vec![Rule(record)],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(Rule(record)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
