//! Per-record results and the batch report.

use crate::structured::Evaluation;
use crate::tokens::CostEstimate;
use crate::types::Record;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Number of error entries shown to a user after a run.
pub const ERROR_PREVIEW_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Succeeded,
    Exhausted,
}

/// Outcome of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordResult {
    pub index: usize,
    /// The input record with the raw output stored under the result column.
    pub record: Record,
    pub output: String,
    pub attempts: u32,
    pub eval: Evaluation,
    pub status: RecordStatus,
}

impl RecordResult {
    /// A record whose request succeeded. Validity follows the parse of `output`.
    pub fn completed(
        index: usize,
        record: Record,
        result_column: &str,
        output: String,
        attempts: u32,
    ) -> Self {
        let eval = Evaluation::from_output(&output);
        Self {
            index,
            record: record.with(result_column, output.clone()),
            output,
            attempts,
            eval,
            status: RecordStatus::Succeeded,
        }
    }

    /// A record that ran out of attempts; `output` carries the failure text.
    pub fn exhausted(
        index: usize,
        record: Record,
        result_column: &str,
        output: String,
        attempts: u32,
    ) -> Self {
        Self {
            index,
            record: record.with(result_column, output.clone()),
            eval: Evaluation::invalid(output.clone()),
            output,
            attempts,
            status: RecordStatus::Exhausted,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.eval.valid
    }

    /// Flat export row: the record plus `eval.*` columns.
    pub fn to_record(&self) -> Record {
        let mut row = self.record.clone();
        row.insert("eval.valid", self.eval.valid);
        if let Some(json) = &self.eval.json {
            row.insert("eval.json", json.to_string());
        }
        if let Some(score) = self.eval.score {
            row.insert("eval.score", score);
        }
        if let Some(decision) = &self.eval.decision {
            row.insert("eval.decision", decision.clone());
        }
        if let Some(reason) = &self.eval.reason {
            row.insert("eval.reason", reason.clone());
        }
        row
    }
}

/// One slot of the output sequence; same length and order as the input.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRow {
    /// Never admitted (the batch was paused first) or its task died.
    Pending(Record),
    Resolved(RecordResult),
}

impl BatchRow {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BatchRow::Resolved(_))
    }

    pub fn result(&self) -> Option<&RecordResult> {
        match self {
            BatchRow::Resolved(r) => Some(r),
            BatchRow::Pending(_) => None,
        }
    }

    pub fn to_record(&self) -> Record {
        match self {
            BatchRow::Pending(r) => r.clone(),
            BatchRow::Resolved(r) => r.to_record(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    Done,
    Paused,
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Done => write!(f, "done"),
            BatchOutcome::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost_usd: f64,
    pub records_processed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Everything a caller gets back from a run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
    pub errors: BTreeMap<usize, String>,
    pub cost: CostEstimate,
}

impl BatchReport {
    pub fn message(&self) -> String {
        let s = &self.summary;
        match self.outcome {
            BatchOutcome::Done => format!(
                "Processed {} of {} records ({} failed). Estimated cost: ${:.4}",
                s.records_processed, s.total, s.failed, s.estimated_cost_usd
            ),
            BatchOutcome::Paused => format!(
                "Paused after {} of {} records. Estimated cost: ${:.4}",
                s.records_processed, s.total, s.estimated_cost_usd
            ),
        }
    }

    pub fn error_preview(&self) -> Vec<(usize, &str)> {
        self.errors
            .iter()
            .take(ERROR_PREVIEW_LIMIT)
            .map(|(i, e)| (*i, e.as_str()))
            .collect()
    }

    pub fn results(&self) -> impl Iterator<Item = &RecordResult> {
        self.rows.iter().filter_map(BatchRow::result)
    }

    pub fn pending(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_resolved()).count()
    }

    pub fn flattened_rows(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.to_record().into_value())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::PriceTable;

    fn report(outcome: BatchOutcome, processed: usize, failed: usize) -> BatchReport {
        let cost = PriceTable::default().estimate("gpt-4o-mini", 2000, 3000);
        BatchReport {
            outcome,
            rows: Vec::new(),
            summary: BatchSummary {
                prompt_tokens: 2000,
                completion_tokens: 3000,
                estimated_cost_usd: cost.total_cost,
                records_processed: processed,
                failed,
                total: 4,
            },
            errors: BTreeMap::new(),
            cost,
        }
    }

    #[test]
    fn test_completed_result_merges_output() {
        let record = Record::new().with("text", "hi");
        let r = RecordResult::completed(0, record, "llm_output", r#"{"score": 4}"#.into(), 1);
        assert!(r.is_valid());
        assert_eq!(r.record.text("llm_output").as_deref(), Some(r#"{"score": 4}"#));
        assert_eq!(r.record.text("text").as_deref(), Some("hi"));

        let flat = r.to_record();
        assert_eq!(flat.get("eval.valid"), Some(&Value::Bool(true)));
        assert_eq!(flat.text("eval.json").as_deref(), Some(r#"{"score":4}"#));
        assert_eq!(flat.get("eval.score"), Some(&serde_json::json!(4.0)));
        assert!(!flat.contains("eval.reason"));
    }

    #[test]
    fn test_exhausted_result_is_invalid() {
        let r = RecordResult::exhausted(
            2,
            Record::new(),
            "out",
            "Exhausted 3 attempts: boom".into(),
            3,
        );
        assert!(!r.is_valid());
        assert_eq!(r.status, RecordStatus::Exhausted);
        assert_eq!(r.eval.error.as_deref(), Some("Exhausted 3 attempts: boom"));
        assert_eq!(r.to_record().get("eval.valid"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            report(BatchOutcome::Done, 4, 1).message(),
            "Processed 4 of 4 records (1 failed). Estimated cost: $2.1000"
        );
        assert_eq!(
            report(BatchOutcome::Paused, 2, 0).message(),
            "Paused after 2 of 4 records. Estimated cost: $2.1000"
        );
    }

    #[test]
    fn test_error_preview_capped() {
        let mut r = report(BatchOutcome::Done, 4, 0);
        for i in (0..30).rev() {
            r.errors.insert(i, format!("e{i}"));
        }
        let preview = r.error_preview();
        assert_eq!(preview.len(), ERROR_PREVIEW_LIMIT);
        assert_eq!(preview[0], (0, "e0"));
    }
}
