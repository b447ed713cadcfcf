//! 弹性模式模块：提供并发准入限制与重试退避策略。
//!
//! # Resilience Primitives Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`limiter`] | FIFO-fair admission gate capping concurrently running tasks |
//! | [`backoff`] | Retry budget and delay policy (linear or capped exponential) |
//!
//! ## Concurrency Limiter
//!
//! ```rust
//! use ai_batch_rust::resilience::ConcurrencyLimiter;
//!
//! # #[tokio::main]
//! # async fn main() -> ai_batch_rust::Result<()> {
//! let limiter = ConcurrencyLimiter::new(4);
//! let answer = limiter.submit(|| async { 42 }).await?;
//! assert_eq!(answer, 42);
//! assert_eq!(limiter.snapshot().running, 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry Policy
//!
//! ```rust
//! use ai_batch_rust::resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(2, Duration::from_millis(500));
//! assert_eq!(policy.delay_for(2), Duration::from_secs(1));
//! ```

pub mod backoff;
pub mod limiter;

pub use backoff::{BackoffStrategy, RetryPolicy};
pub use limiter::{ConcurrencyLimiter, LimiterPermit, LimiterSnapshot};
