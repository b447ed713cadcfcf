//! # ai-batch-rust
//!
//! 面向 LLM 对话补全接口的有界并发批处理引擎：模板渲染、重试退避、协作式暂停与成本估算。
//!
//! Bounded-concurrency batch runner for OpenAI-compatible chat-completion endpoints.
//!
//! ## Overview
//!
//! Each input [`Record`] is rendered into a prompt, sent to the model, and the reply is
//! opportunistically parsed as JSON. The engine keeps at most `concurrency` records in
//! flight, retries failed requests with backoff, isolates failures per record, and
//! reports progress and estimated cost as it goes.
//!
//! ## Key Features
//!
//! - **Bounded concurrency**: FIFO admission through [`resilience::ConcurrencyLimiter`]
//! - **Retries**: linear or capped exponential backoff via [`resilience::RetryPolicy`]
//! - **Pause**: [`batch::CancelHandle`] stops new work without aborting in-flight requests
//! - **Lenient parsing**: fenced or chatty JSON output recovered by [`structured`]
//! - **Cost**: per-model pricing with a default fallback in [`tokens`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_batch_rust::{BatchJobConfig, BatchOrchestrator, Record};
//!
//! #[tokio::main]
//! async fn main() -> ai_batch_rust::Result<()> {
//!     let config = BatchJobConfig::new("Classify the sentiment of: {{text}}. Reply as JSON.")
//!         .resolve_credential();
//!     let orchestrator = BatchOrchestrator::from_config(config)?;
//!
//!     let records = vec![
//!         Record::new().with("text", "I love it"),
//!         Record::new().with("text", "Broke after a day"),
//!     ];
//!     let report = orchestrator.run(records).await?;
//!     println!("{}", report.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Orchestrator, per-record retry loop, cancellation, progress, report |
//! | [`client`] | Chat-completion client and the [`CompletionBackend`] seam |
//! | [`config`] | Job configuration: YAML, env overrides, keyring credentials |
//! | [`resilience`] | Concurrency limiter and retry policy |
//! | [`structured`] | JSON recovery from model output |
//! | [`template`] | `{{ column }}` prompt rendering |
//! | [`tokens`] | Token usage and cost estimation |
//! | [`transport`] | HTTP transport |
//! | [`types`] | Records and chat messages |

pub mod batch;
pub mod client;
pub mod config;
pub mod resilience;
pub mod structured;
pub mod template;
pub mod tokens;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use batch::{BatchOrchestrator, BatchOutcome, BatchReport, BatchRow, CancelHandle};
pub use client::{CompletionBackend, CompletionClient, CompletionClientBuilder};
pub use config::BatchJobConfig;
pub use types::{Message, MessageRole, Record};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
