//! Error/warning message channels

use serde_json::Value;

/// Drop empty entries from a message list
pub fn normalize_messages<I, S>(messages: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    messages
        .into_iter()
        .map(Into::into)
        .filter(|m| !m.is_empty())
        .collect()
}

/// Coerce loose message input into a list.
///
/// A string becomes a singleton, arrays keep their string entries, anything
/// else (null, numbers, objects) yields nothing.
pub fn messages_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => normalize_messages([s.as_str()]),
        Value::Array(items) => normalize_messages(items.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    }
}

/// Rule-origin messages first, then effect-origin ones
pub fn merge_channels(rule: &[String], effect: &[String]) -> Vec<String> {
    rule.iter().chain(effect).cloned().collect()
}
