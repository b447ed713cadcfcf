//! 批处理编排模块：在有界并发下逐条执行记录，带重试退避、协作式取消与进度统计。
//!
//! # Batch Orchestration Module
//!
//! Turns N independent records into a controlled stream of completion requests.
//! At most `concurrency` records are in flight; each record gets up to
//! `max_retries + 1` attempts; a failing record never affects its neighbours.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchOrchestrator`] | Validates config, prepares and executes runs |
//! | [`BatchRun`] | One prepared run: cancel handle, progress channel, `execute()` |
//! | [`CancelHandle`] | Cooperative pause: stops admission and retries, never aborts requests |
//! | [`BatchState`] | Atomic counters, per-record error log, progress `watch` channel |
//! | [`BatchReport`] | Rows in input order, outcome, token and cost summary |
//!
//! ## Example
//!
//! ```rust,no_run
//! use ai_batch_rust::batch::BatchOrchestrator;
//! use ai_batch_rust::config::BatchJobConfig;
//! use ai_batch_rust::types::Record;
//!
//! # #[tokio::main]
//! # async fn main() -> ai_batch_rust::Result<()> {
//! let config = BatchJobConfig::new("Rate this review 1-10 as JSON: {{text}}")
//!     .with_api_key("sk-...")
//!     .with_concurrency(4);
//! let orchestrator = BatchOrchestrator::from_config(config)?;
//!
//! let records = vec![Record::new().with("text", "Works as advertised.")];
//! let run = orchestrator.prepare(records)?;
//! let cancel = run.cancel_handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     cancel.cancel();
//! });
//!
//! let report = run.execute().await;
//! println!("{}", report.message());
//! # Ok(())
//! # }
//! ```
//!
//! ## Record lifecycle
//!
//! - **Pending**: waiting for a limiter slot; stays pending if the batch is paused first
//! - **Attempting**: prompt rendered once, request in flight
//! - **Retrying**: sleeping `delay_for(attempts)` after a failure, interruptible by cancel
//! - **Succeeded** / **Exhausted**: terminal; progress is published exactly once

mod cancel;
mod orchestrator;
mod result;
mod state;

pub use cancel::CancelHandle;
pub use orchestrator::{BatchOrchestrator, BatchRun};
pub use result::{
    BatchOutcome, BatchReport, BatchRow, BatchSummary, RecordResult, RecordStatus,
    ERROR_PREVIEW_LIMIT,
};
pub use state::{BatchProgress, BatchState};
