//! Chat-completion client.
//!
//! One call, one HTTP request: retries and backoff are the batch orchestrator's job.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod types;

pub use builder::CompletionClientBuilder;
pub use self::core::{CompletionBackend, CompletionClient};
pub use types::{Completion, CompletionRequest};
