//! Batch orchestrator: admission, per-record retry loop, result collection.

use super::cancel::CancelHandle;
use super::result::{BatchOutcome, BatchReport, BatchRow, BatchSummary, RecordResult};
use super::state::{BatchProgress, BatchState};
use crate::client::{CompletionBackend, CompletionClient, CompletionRequest};
use crate::config::BatchJobConfig;
use crate::resilience::{ConcurrencyLimiter, LimiterPermit, RetryPolicy};
use crate::template::render_with_context;
use crate::tokens::PriceTable;
use crate::types::Record;
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Key bound to the configured text column when rendering prompts.
const TEXT_BINDING: &str = "text";

/// Runs a record set through a completion backend.
pub struct BatchOrchestrator {
    config: Arc<BatchJobConfig>,
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    pricing: PriceTable,
}

impl BatchOrchestrator {
    /// Validate `config` and use `backend` for every request.
    pub fn new(config: BatchJobConfig, backend: Arc<dyn CompletionBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, backend))
    }

    /// Validate `config` and talk to the endpoint it names over HTTP.
    pub fn from_config(config: BatchJobConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config.api_key.clone().unwrap_or_default();
        let mut builder = CompletionClient::builder()
            .api_key(api_key)
            .base_url(config.base_url.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self::assemble(config, Arc::new(client)))
    }

    /// Callers have already validated `config`.
    fn assemble(config: BatchJobConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        let retry = config.retry_policy();
        Self {
            config: Arc::new(config),
            backend,
            retry,
            pricing: PriceTable::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: PriceTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &BatchJobConfig {
        &self.config
    }

    /// Set up a run over `records` without starting it.
    pub fn prepare(&self, records: Vec<Record>) -> Result<BatchRun> {
        if records.is_empty() {
            return Err(Error::configuration_with_context(
                "no records to process",
                ErrorContext::new()
                    .with_field_path("records")
                    .with_source("batch_orchestrator"),
            ));
        }
        let state = Arc::new(BatchState::new(records.len()));
        Ok(BatchRun {
            ctx: Arc::new(TaskContext {
                config: self.config.clone(),
                backend: self.backend.clone(),
                retry: self.retry.clone(),
                state,
                cancel: CancelHandle::new(),
            }),
            limiter: ConcurrencyLimiter::new(self.config.concurrency),
            pricing: self.pricing.clone(),
            records,
        })
    }

    /// Prepare and execute in one go.
    pub async fn run(&self, records: Vec<Record>) -> Result<BatchReport> {
        Ok(self.prepare(records)?.execute().await)
    }
}

/// Shared by every task of one run.
struct TaskContext {
    config: Arc<BatchJobConfig>,
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    state: Arc<BatchState>,
    cancel: CancelHandle,
}

/// A prepared run. Grab the cancel handle and progress receiver before executing.
pub struct BatchRun {
    ctx: Arc<TaskContext>,
    limiter: ConcurrencyLimiter,
    pricing: PriceTable,
    records: Vec<Record>,
}

impl BatchRun {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.ctx.cancel.clone()
    }

    pub fn state(&self) -> Arc<BatchState> {
        self.ctx.state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.ctx.state.subscribe()
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Admit records in index order, wait for every admitted task, build the report.
    pub async fn execute(self) -> BatchReport {
        let BatchRun {
            ctx,
            limiter,
            pricing,
            records,
        } = self;
        let total = records.len();
        let start = Instant::now();
        info!(
            total,
            concurrency = limiter.limit(),
            model = %ctx.config.model,
            max_retries = ctx.retry.max_retries,
            "batch started"
        );

        let mut tasks = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                info!(index, "batch cancelled; admission stopped");
                break;
            }
            let permit = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    info!(index, "batch cancelled while waiting for a slot");
                    break;
                }
                permit = limiter.acquire() => permit,
            };
            let permit = match permit {
                Ok(p) => p,
                Err(e) => {
                    error!(index, error = %e, "admission failed");
                    break;
                }
            };
            // The slot may have opened in the same instant the batch was paused.
            if ctx.cancel.is_cancelled() {
                info!(index, "batch cancelled; admission stopped");
                break;
            }
            tasks.spawn(run_task(ctx.clone(), index, record.clone(), permit));
        }

        let mut rows: Vec<BatchRow> = records.into_iter().map(BatchRow::Pending).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    let index = result.index;
                    rows[index] = BatchRow::Resolved(result);
                }
                Err(e) => error!(error = %e, "record task failed to complete"),
            }
        }

        let state = &ctx.state;
        let completed = state.completed();
        // Any pause requested before the last task drained counts, even if every
        // admitted record went on to settle normally.
        let outcome = if ctx.cancel.is_cancelled() {
            BatchOutcome::Paused
        } else {
            BatchOutcome::Done
        };

        let usage = state.usage();
        let cost = pricing.estimate(
            &ctx.config.model,
            usage.prompt_tokens,
            usage.completion_tokens,
        );
        let summary = BatchSummary {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            estimated_cost_usd: cost.total_cost,
            records_processed: completed,
            failed: state.failed(),
            total,
        };
        info!(
            outcome = %outcome,
            completed,
            failed = summary.failed,
            prompt_tokens = summary.prompt_tokens,
            completion_tokens = summary.completion_tokens,
            cost = %cost.format(),
            duration_ms = start.elapsed().as_millis() as u64,
            "batch finished"
        );

        BatchReport {
            outcome,
            rows,
            summary,
            errors: state.errors(),
            cost,
        }
    }
}

/// Attempt loop for one record. The permit is held until the record settles.
async fn run_task(
    ctx: Arc<TaskContext>,
    index: usize,
    record: Record,
    _permit: LimiterPermit,
) -> RecordResult {
    let config = &ctx.config;
    let prompt = render_prompt(config, &record);
    let mut request =
        CompletionRequest::new(config.model.clone(), prompt).temperature(config.temperature);
    if let Some(system) = &config.system_prompt {
        request = request.system(system.clone());
    }

    let mut attempts: u32 = 0;
    loop {
        let failure = match ctx.backend.complete(&request).await {
            Ok(completion) => {
                attempts += 1;
                ctx.state.record_usage(&completion.usage);
                let result = RecordResult::completed(
                    index,
                    record,
                    &config.result_column,
                    completion.content,
                    attempts,
                );
                debug!(index, attempts, valid = result.is_valid(), "record completed");
                ctx.state.mark_settled(false);
                return result;
            }
            Err(e) => e,
        };

        attempts += 1;
        let message = failure.to_string();
        warn!(index, attempt = attempts, error = %message, "record attempt failed");
        ctx.state.record_error(index, message.clone());

        if ctx.retry.should_retry(attempts) {
            let delay = ctx.retry.delay_for(attempts);
            let resumed = !ctx.cancel.is_cancelled()
                && tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = ctx.cancel.cancelled() => false,
                };
            if resumed {
                continue;
            }
            debug!(index, attempts, "retry abandoned after cancellation");
        }

        let exhausted = Error::ExhaustedRetries {
            attempts,
            last_error: message,
        };
        let result = RecordResult::exhausted(
            index,
            record,
            &config.result_column,
            exhausted.to_string(),
            attempts,
        );
        ctx.state.mark_settled(true);
        return result;
    }
}

fn render_prompt(config: &BatchJobConfig, record: &Record) -> String {
    let mut extra = HashMap::new();
    if let Some(text) = config
        .text_column
        .as_deref()
        .and_then(|column| record.text(column))
    {
        extra.insert(TEXT_BINDING.to_string(), text);
    }
    render_with_context(&config.user_prompt_template, record, &extra)
}
