//! 结构化输出模块：从模型自由文本中恢复 JSON 并提取评估字段。
//!
//! # Structured Output Module
//!
//! Models asked for JSON often wrap it in a fenced code block or surround it with
//! prose. This module recovers the JSON value anyway and lifts a few well-known
//! scalar fields out of it:
//!
//! - [`parse_json_output`]: fence stripping, direct parse, then a `{ … }` fallback
//! - [`Evaluation`]: validity flag, parsed value, and promoted `score` / `decision` / `reason`
//! - [`ParseError`]: why a response could not be parsed
//!
//! # Examples
//!
//! ```
//! use ai_batch_rust::structured::{parse_json_output, Evaluation};
//!
//! let value = parse_json_output("```json\n{\"score\": 7}\n```").unwrap();
//! assert_eq!(value["score"], 7);
//!
//! let eval = Evaluation::from_output("Sure! {\"decision\": \"approve\"} Hope that helps.");
//! assert!(eval.valid);
//! assert_eq!(eval.decision.as_deref(), Some("approve"));
//! ```

pub mod error;
pub mod evaluation;
pub mod extract;

pub use error::ParseError;
pub use evaluation::Evaluation;
pub use extract::{parse_json_output, strip_code_fence};
