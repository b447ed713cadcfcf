//! Error types for output parsing.

use thiserror::Error;

/// Why a model response could not be turned into JSON.
///
/// These never abort a batch; they mark the record's evaluation invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty model output")]
    EmptyInput,

    /// Carries the message of the last parse attempt.
    #[error("unparseable model output: {0}")]
    UnparseableOutput(String),
}
