//! Error events and their metadata

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Grouped key-value tables attached to an event (tab -> key -> value)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetaData(BTreeMap<String, BTreeMap<String, Value>>);

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to a tab, creating the tab if needed
    pub fn add(&mut self, tab: &str, key: &str, value: impl Into<Value>) {
        self.0
            .entry(tab.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Builder-style [`MetaData::add`]
    pub fn with(mut self, tab: &str, key: &str, value: impl Into<Value>) -> Self {
        self.add(tab, key, value);
        self
    }

    pub fn get(&self, tab: &str, key: &str) -> Option<&Value> {
        self.0.get(tab).and_then(|t| t.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with every key matching `redact` replaced by `"[FILTERED]"`,
    /// at any nesting depth
    pub fn sanitized(&self, redact: impl Fn(&str) -> bool) -> Self {
        let tabs = self
            .0
            .iter()
            .map(|(tab, entries)| {
                let entries = entries
                    .iter()
                    .map(|(key, value)| (key.clone(), sanitize_value(key, value, &redact)))
                    .collect();
                (tab.clone(), entries)
            })
            .collect();
        Self(tabs)
    }
}

pub const FILTERED: &str = "[FILTERED]";

fn sanitize_value(key: &str, value: &Value, redact: &impl Fn(&str) -> bool) -> Value {
    if redact(key) {
        return Value::String(FILTERED.to_string());
    }
    sanitize_children(value, redact)
}

fn sanitize_children(value: &Value, redact: &impl Fn(&str) -> bool) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize_value(k, v, redact)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items.iter().map(|v| sanitize_children(v, redact)).collect(),
        ),
        other => other.clone(),
    }
}

/// A stack frame supplied by the caller
///
/// The client never captures frames itself; callers that want a location in
/// the report pass one in, usually built from `module_path!()`, `file!()` and
/// `line!()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub method: String,
    pub file: String,
    pub line: u32,
}

impl StackFrame {
    pub fn new(method: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            method: method.into(),
            file: file.into(),
            line,
        }
    }
}

/// A single reported error occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub message: String,
    pub error_class: String,
    pub metadata: MetaData,
    pub stacktrace: Vec<StackFrame>,
}

impl Event {
    /// Create a handled event with the default error class
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_class: "Error".to_string(),
            metadata: MetaData::new(),
            stacktrace: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: MetaData) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stacktrace.push(frame);
        self
    }
}

/// Returned by an interception callback to suppress an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Veto(pub String);

impl Veto {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl fmt::Display for Veto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_tabs() {
        let metadata = MetaData::new()
            .with("Account", "Name", "Company XYZ")
            .with("Account", "Price(dollars)", "1 Million");

        assert_eq!(metadata.get("Account", "Name"), Some(&json!("Company XYZ")));
        assert_eq!(metadata.get("Account", "Missing"), None);
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({"Account": {"Name": "Company XYZ", "Price(dollars)": "1 Million"}})
        );
    }

    #[test]
    fn test_sanitized_nested() {
        let metadata = MetaData::new()
            .with("Request", "password", "hunter2")
            .with(
                "Request",
                "body",
                json!({"api_secret": "x", "user": {"Password": "y", "id": 7}}),
            )
            .with("Request", "items", json!([{"secret": 1}, "plain"]));

        let clean = metadata.sanitized(|k| {
            let k = k.to_lowercase();
            k.contains("password") || k.contains("secret")
        });

        assert_eq!(clean.get("Request", "password"), Some(&json!(FILTERED)));
        assert_eq!(
            clean.get("Request", "body"),
            Some(&json!({"api_secret": FILTERED, "user": {"Password": FILTERED, "id": 7}}))
        );
        assert_eq!(
            clean.get("Request", "items"),
            Some(&json!([{"secret": FILTERED}, "plain"]))
        );
    }

    #[test]
    fn test_event_defaults() {
        let event = Event::new("oops");
        assert_eq!(event.message, "oops");
        assert_eq!(event.error_class, "Error");
        assert!(event.metadata.is_empty());
        assert!(event.stacktrace.is_empty());
    }
}
