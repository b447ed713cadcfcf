//! Shared bookkeeping for one batch run.

use crate::tokens::TokenUsage;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Progress as published after every settled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl BatchProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Counters, error log and progress channel for a run.
///
/// Counters are atomics; the error log sits behind a std mutex that is never held
/// across an await point.
#[derive(Debug)]
pub struct BatchState {
    total: usize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    errors: Mutex<BTreeMap<usize, String>>,
    progress: watch::Sender<BatchProgress>,
}

impl BatchState {
    pub fn new(total: usize) -> Self {
        let (progress, _) = watch::channel(BatchProgress::new(0, total));
        Self {
            total,
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
            errors: Mutex::new(BTreeMap::new()),
            progress,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Count one record as settled and publish progress.
    ///
    /// Returns false if every record was already counted.
    pub fn mark_settled(&self, failed: bool) -> bool {
        let total = self.total;
        let settled = self
            .completed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                (c < total).then_some(c + 1)
            });
        let completed = match settled {
            Ok(prev) => prev + 1,
            Err(_) => return false,
        };
        if failed {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        // Concurrent settles may publish out of order; keep the channel monotonic.
        self.progress.send_if_modified(|current| {
            if completed > current.completed {
                *current = BatchProgress::new(completed, total);
                true
            } else {
                false
            }
        });
        true
    }

    pub fn record_usage(&self, usage: &TokenUsage) {
        self.prompt_tokens
            .fetch_add(usage.prompt_tokens, Ordering::SeqCst);
        self.completion_tokens
            .fetch_add(usage.completion_tokens, Ordering::SeqCst);
    }

    pub fn usage(&self) -> TokenUsage {
        TokenUsage::new(
            self.prompt_tokens.load(Ordering::SeqCst),
            self.completion_tokens.load(Ordering::SeqCst),
        )
    }

    /// Remember the latest error for `index`, replacing any earlier one.
    pub fn record_error(&self, index: usize, message: impl Into<String>) {
        self.lock_errors().insert(index, message.into());
    }

    pub fn errors(&self) -> BTreeMap<usize, String> {
        self.lock_errors().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> BatchProgress {
        *self.progress.borrow()
    }

    fn lock_errors(&self) -> MutexGuard<'_, BTreeMap<usize, String>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(BatchProgress::new(0, 3).percent, 0);
        assert_eq!(BatchProgress::new(1, 3).percent, 33);
        assert_eq!(BatchProgress::new(2, 3).percent, 67);
        assert_eq!(BatchProgress::new(3, 3).percent, 100);
        assert_eq!(BatchProgress::new(0, 0).percent, 0);
    }

    #[test]
    fn test_completed_never_exceeds_total() {
        let state = BatchState::new(2);
        assert!(state.mark_settled(false));
        assert!(state.mark_settled(true));
        assert!(!state.mark_settled(false));
        assert_eq!(state.completed(), 2);
        assert_eq!(state.failed(), 1);
        assert_eq!(state.progress().percent, 100);
    }

    #[test]
    fn test_error_log_keeps_latest() {
        let state = BatchState::new(5);
        state.record_error(3, "first");
        state.record_error(1, "other");
        state.record_error(3, "second");
        let errors = state.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[&3], "second");
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_usage_accumulates() {
        let state = BatchState::new(2);
        state.record_usage(&TokenUsage::new(10, 4));
        state.record_usage(&TokenUsage::new(5, 1));
        assert_eq!(state.usage(), TokenUsage::new(15, 5));
    }

    #[tokio::test]
    async fn test_progress_published() {
        let state = BatchState::new(4);
        let mut rx = state.subscribe();
        state.mark_settled(false);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().completed, 1);
        assert_eq!(rx.borrow().percent, 25);
    }
}
