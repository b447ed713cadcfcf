//! JSON recovery from free-form model text.

use super::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+\-]*").expect("leading fence regex"));
static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```$").expect("trailing fence regex"));

/// Remove a wrapping fenced-code marker (with optional language tag) and trim.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let start = LEADING_FENCE.find(trimmed).map(|m| m.end()).unwrap_or(0);
    let inner = &trimmed[start..];
    let end = TRAILING_FENCE
        .find(inner)
        .map(|m| m.start())
        .unwrap_or(inner.len());
    inner[..end].trim()
}

/// Recover a JSON value from model output.
///
/// Tries the fence-stripped text as a whole first, then the span between the first
/// `{` and the last `}`.
pub fn parse_json_output(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let stripped = strip_code_fence(text);
    let mut last_err = match serde_json::from_str::<Value>(stripped) {
        Ok(v) => return Ok(v),
        Err(e) => e.to_string(),
    };

    if let (Some(open), Some(close)) = (stripped.find('{'), stripped.rfind('}')) {
        if open < close {
            match serde_json::from_str::<Value>(&stripped[open..=close]) {
                Ok(v) => return Ok(v),
                Err(e) => last_err = e.to_string(),
            }
        }
    }

    Err(ParseError::UnparseableOutput(last_err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(parse_json_output(""), Err(ParseError::EmptyInput));
        assert_eq!(parse_json_output("  \n\t "), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_plain_json() {
        assert_eq!(
            parse_json_output(r#"{"a": 1, "b": [true, null]}"#).unwrap(),
            json!({"a": 1, "b": [true, null]})
        );
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let text = "```json\n{\"score\": 9, \"decision\": \"yes\"}\n```";
        assert_eq!(
            parse_json_output(text).unwrap(),
            json!({"score": 9, "decision": "yes"})
        );
    }

    #[test]
    fn test_fenced_without_language_tag() {
        assert_eq!(parse_json_output("```\n[1,2,3]\n```").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_surrounding_prose() {
        let text = "Here is my answer: {\"ok\": true}. Let me know!";
        assert_eq!(parse_json_output(text).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_round_trip_values() {
        let values = [
            json!({"nested": {"k": [1, "two", 3.5]}, "s": "x"}),
            json!([{"a": 1}, {"b": 2}]),
            json!("just a string"),
            json!(42),
            json!(null),
        ];
        for v in values {
            let text = serde_json::to_string(&v).unwrap();
            assert_eq!(parse_json_output(&text).unwrap(), v);
            let fenced = format!("```json\n{}\n```", text);
            assert_eq!(parse_json_output(&fenced).unwrap(), v);
        }
    }

    #[test]
    fn test_not_json() {
        match parse_json_output("not json at all") {
            Err(ParseError::UnparseableOutput(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected UnparseableOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_braces_in_wrong_order() {
        assert!(matches!(
            parse_json_output("} nope {"),
            Err(ParseError::UnparseableOutput(_))
        ));
    }

    #[test]
    fn test_broken_object_reports_last_error() {
        let err = parse_json_output("prefix {\"a\": } suffix").unwrap_err();
        assert!(matches!(err, ParseError::UnparseableOutput(_)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  ```yaml\nkey: v\n```  "), "key: v");
        assert_eq!(strip_code_fence("plain"), "plain");
    }
}
