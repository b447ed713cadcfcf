//! Batch Processing Example
//!
//! Runs a small batch against an in-process backend so it works offline:
//! - BatchJobConfig for prompt, concurrency and retry settings
//! - BatchOrchestrator / BatchRun for execution
//! - progress updates over a watch channel
//! - a flaky record that recovers on retry and one that never does
//!
//! Usage:
//!   cargo run --example batch_processing

use ai_batch_rust::batch::{BatchOrchestrator, BatchRow};
use ai_batch_rust::client::{Completion, CompletionBackend, CompletionRequest};
use ai_batch_rust::tokens::TokenUsage;
use ai_batch_rust::{BatchJobConfig, Error, Record};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Grades by prompt length; fails the first call for "flaky" and every call for "broken".
struct DemoBackend {
    calls: Mutex<HashMap<String, u32>>,
}

#[async_trait]
impl CompletionBackend for DemoBackend {
    async fn complete(&self, request: &CompletionRequest) -> ai_batch_rust::Result<Completion> {
        let seen = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(request.prompt.clone()).or_insert(0);
            *n += 1;
            *n
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        if request.prompt.contains("broken") || (request.prompt.contains("flaky") && seen == 1) {
            return Err(Error::Remote {
                status: 503,
                message: r#"{"error":"overloaded"}"#.to_string(),
            });
        }
        let score = request.prompt.len() % 10;
        Ok(Completion {
            content: format!(
                "```json\n{{\"score\": {score}, \"decision\": \"{}\"}}\n```",
                if score > 4 { "accept" } else { "reject" }
            ),
            usage: TokenUsage::new(request.prompt.len() as u64, 12),
        })
    }
}

#[tokio::main]
async fn main() -> ai_batch_rust::Result<()> {
    println!("=== ai-batch-rust Batch Processing Demo ===\n");

    let config = BatchJobConfig::new("Grade this note: {{text}}")
        .with_api_key("demo-key")
        .with_system_prompt("Reply with JSON only.")
        .with_concurrency(2)
        .with_max_retries(1)
        .with_backoff_base(Duration::from_millis(100));

    let backend = Arc::new(DemoBackend {
        calls: Mutex::new(HashMap::new()),
    });
    let orchestrator = BatchOrchestrator::new(config, backend)?;

    let records: Vec<Record> = ["short", "a somewhat longer note", "flaky", "broken", "ok"]
        .iter()
        .map(|t| Record::new().with("text", *t))
        .collect();

    let run = orchestrator.prepare(records)?;
    let mut progress = run.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = *progress.borrow();
            println!("progress: {}/{} ({}%)", p.completed, p.total, p.percent);
        }
    });

    let report = run.execute().await;
    watcher.abort();

    println!("\n{}\n", report.message());
    for row in &report.rows {
        match row {
            BatchRow::Resolved(r) => println!(
                "#{} attempts={} valid={} score={:?} decision={:?}",
                r.index, r.attempts, r.eval.valid, r.eval.score, r.eval.decision
            ),
            BatchRow::Pending(_) => println!("(pending)"),
        }
    }
    for (index, error) in report.error_preview() {
        println!("error at #{index}: {error}");
    }
    Ok(())
}
