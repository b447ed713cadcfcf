//! Input records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of tabular input: column name → scalar value (or null).
///
/// Column order is preserved through (de)serialization, so `{{json}}` renders
/// columns in the order they were loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build a record from a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cell text as it appears in a prompt. Null renders empty; nested values render as JSON.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(value_text)
    }

    /// Compact JSON of the whole record.
    pub fn to_json_string(&self) -> String {
        // A map of serde_json values always serializes.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preserves_column_order() {
        let r = Record::from_pairs([("zeta", json!(1)), ("alpha", json!("x"))]);
        assert_eq!(r.to_json_string(), r#"{"zeta":1,"alpha":"x"}"#);
        let cols: Vec<_> = r.columns().cloned().collect();
        assert_eq!(cols, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_text_forms() {
        let r = Record::new()
            .with("s", "hello")
            .with("n", 4.5)
            .with("b", true)
            .with("nil", Value::Null)
            .with("arr", json!([1, 2]));
        assert_eq!(r.text("s").as_deref(), Some("hello"));
        assert_eq!(r.text("n").as_deref(), Some("4.5"));
        assert_eq!(r.text("b").as_deref(), Some("true"));
        assert_eq!(r.text("nil").as_deref(), Some(""));
        assert_eq!(r.text("arr").as_deref(), Some("[1,2]"));
        assert_eq!(r.text("missing"), None);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Record::from_value(json!([1, 2])).is_none());
        let r = Record::from_value(json!({"a": 1})).unwrap();
        assert_eq!(r.len(), 1);
    }
}
