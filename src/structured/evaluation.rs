//! Evaluation of a single model response.

use super::extract::parse_json_output;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed view of a model response.
///
/// `valid` is true exactly when the output parsed as JSON. The scalar fields are
/// only populated when the parsed value is an object carrying them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Evaluation {
    /// Parse `output` and promote well-known fields.
    pub fn from_output(output: &str) -> Self {
        match parse_json_output(output) {
            Ok(value) => Self::from_value(value),
            Err(e) => Self::invalid(e.to_string()),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let (score, decision, reason) = match value.as_object() {
            Some(obj) => (
                obj.get("score").and_then(promote_number),
                obj.get("decision").and_then(promote_label),
                obj.get("reason").and_then(|v| v.as_str()).map(str::to_string),
            ),
            None => (None, None, None),
        };
        Self {
            valid: true,
            json: Some(value),
            error: None,
            score,
            decision,
            reason,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

fn promote_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn promote_label(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
