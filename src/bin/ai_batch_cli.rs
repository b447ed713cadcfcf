//! ai-batch-cli — 批量调用对话补全接口的命令行工具
//!
//! Usage:
//!   ai-batch-cli run --config <job.yaml> --input <records.json> [--output <results.json>]
//!   ai-batch-cli version
//!
//! Ctrl-C pauses the batch: records already in flight finish, the rest stay untouched.

use ai_batch_rust::batch::{BatchOrchestrator, BatchOutcome, BatchReport, ERROR_PREVIEW_LIMIT};
use ai_batch_rust::config::BatchJobConfig;
use ai_batch_rust::types::Record;
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_DONE: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_PAUSED: i32 = 2;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(EXIT_FAILURE);
    }

    let code = match args[1].as_str() {
        "run" => {
            init_tracing();
            match cmd_run(&args[2..]).await {
                Ok(BatchOutcome::Done) => EXIT_DONE,
                Ok(BatchOutcome::Paused) => EXIT_PAUSED,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    EXIT_FAILURE
                }
            }
        }
        "version" | "--version" | "-V" => {
            println!("ai-batch-cli {}", env!("CARGO_PKG_VERSION"));
            EXIT_DONE
        }
        "help" | "--help" | "-h" => {
            print_usage();
            EXIT_DONE
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn print_usage() {
    println!(
        r#"ai-batch-cli — LLM 批处理命令行工具

USAGE:
    ai-batch-cli <COMMAND> [OPTIONS]

COMMANDS:
    run --config <job.yaml> --input <records.json> [--output <results.json>]
                                Process every record; Ctrl-C pauses
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    OPENAI_API_KEY              Credential used when the keyring has none
    AI_BATCH_CONCURRENCY        Override the job's concurrency limit
    AI_BATCH_MAX_RETRIES        Override the job's retry budget
    AI_BATCH_MODEL              Override the job's model
    AI_BATCH_BASE_URL           Override the endpoint host
    RUST_LOG                    Log filter (default: info)

EXIT CODES:
    0 done, 2 paused, 1 configuration or I/O error"#
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct RunArgs {
    config: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
}

fn parse_run_args(args: &[String]) -> anyhow::Result<RunArgs> {
    let mut config = None;
    let mut input = None;
    let mut output = None;
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let slot = match flag.as_str() {
            "--config" => &mut config,
            "--input" => &mut input,
            "--output" => &mut output,
            other => bail!("unknown option: {other}"),
        };
        let value = iter
            .next()
            .with_context(|| format!("{flag} requires a value"))?;
        *slot = Some(PathBuf::from(value));
    }
    Ok(RunArgs {
        config: config.context("--config is required")?,
        input: input.context("--input is required")?,
        output,
    })
}

async fn load_records(path: &PathBuf) -> anyhow::Result<Vec<Record>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .with_context(|| format!("{} must be a JSON array of objects", path.display()))?;
    Ok(records)
}

async fn cmd_run(args: &[String]) -> anyhow::Result<BatchOutcome> {
    let args = parse_run_args(args)?;
    let config = BatchJobConfig::from_yaml_file(&args.config)
        .await?
        .apply_env_overrides()
        .resolve_credential();
    let records = load_records(&args.input).await?;

    let orchestrator = BatchOrchestrator::from_config(config)?;
    let run = orchestrator.prepare(records)?;

    let cancel = run.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; pausing after in-flight records settle");
            cancel.cancel();
        }
    });

    let mut progress = run.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = *progress.borrow();
            info!(completed = p.completed, total = p.total, percent = p.percent, "progress");
        }
    });

    let report = run.execute().await;
    reporter.abort();

    // stdout carries only the JSON rows so it can be piped.
    for line in summary_lines(&report) {
        eprintln!("{line}");
    }

    let rows = rows_document(&report)?;
    match &args.output {
        Some(path) => tokio::fs::write(path, rows)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rows}"),
    }
    Ok(report.outcome)
}

/// Outcome line plus the error preview, for stderr.
fn summary_lines(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![report.message()];
    for (index, error) in report.error_preview() {
        lines.push(format!("  record {index}: {error}"));
    }
    if report.errors.len() > ERROR_PREVIEW_LIMIT {
        lines.push(format!(
            "  ... and {} more",
            report.errors.len() - ERROR_PREVIEW_LIMIT
        ));
    }
    lines
}

/// The flattened rows as a pretty JSON array.
fn rows_document(report: &BatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&report.flattened_rows())
}
