//! Per-document execution guard.
//!
//! Each guarded step gets its own wall-clock budget. The step runs as a
//! future under [`tokio::time::timeout`]; CPU-bound parts inside it run on
//! the blocking pool and poll a cooperative [`Deadline`] so an abandoned
//! worker winds down instead of running to completion.
//!
//! Guarded steps only *compute*. Their result is handed back to the caller,
//! which performs any write after the guard returns, so a timed-out
//! document keeps whatever was on disk before the step started.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::DedupError;

/// Cooperative cancellation point shared with a guarded worker
#[derive(Debug, Clone)]
pub struct Deadline {
    document: String,
    timeout: Duration,
    expires_at: Instant,
}

impl Deadline {
    pub fn new(document: impl Into<String>, timeout: Duration) -> Self {
        Self {
            document: document.into(),
            timeout,
            expires_at: Instant::now() + timeout,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Fail with `DocumentTimeout` once the budget is spent
    pub fn check(&self) -> Result<(), DedupError> {
        if self.is_expired() {
            return Err(self.timeout_error());
        }
        Ok(())
    }

    fn timeout_error(&self) -> DedupError {
        DedupError::DocumentTimeout {
            document: self.document.clone(),
            timeout: self.timeout,
        }
    }
}

/// Bounds the time spent on any single document
#[derive(Debug, Clone, Copy)]
pub struct ExecutionGuard {
    timeout: Duration,
}

impl ExecutionGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one guarded step for `document`. The deadline is armed fresh for
    /// every call.
    pub async fn run<T, F, Fut>(&self, document: &str, step: F) -> Result<T, DedupError>
    where
        F: FnOnce(Deadline) -> Fut,
        Fut: Future<Output = Result<T, DedupError>>,
    {
        let deadline = Deadline::new(document, self.timeout);
        let expired = deadline.timeout_error();

        match tokio::time::timeout(self.timeout, step(deadline)).await {
            Ok(result) => {
                debug!(document, ok = result.is_ok(), "Guarded step finished");
                result
            }
            Err(_elapsed) => {
                warn!(document, timeout_ms = self.timeout.as_millis() as u64, "Guarded step timed out");
                Err(expired)
            }
        }
    }
}

/// Run CPU-bound work on the blocking pool, mapping a worker panic to a
/// per-document error.
pub async fn run_blocking<T, F>(deadline: Deadline, work: F) -> Result<T, DedupError>
where
    F: FnOnce(&Deadline) -> Result<T, DedupError> + Send + 'static,
    T: Send + 'static,
{
    let document = deadline.document().to_string();
    tokio::task::spawn_blocking(move || {
        deadline.check()?;
        work(&deadline)
    })
    .await
    .map_err(|e| DedupError::WorkerFailed {
        document,
        message: e.to_string(),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fast_step_succeeds() {
        let guard = ExecutionGuard::new(Duration::from_secs(1));
        let result = guard.run("a.md", |_deadline| async { Ok(sum_to(100)) }).await;
        assert_eq!(result.unwrap(), 4950);
    }

    fn sum_to(n: u64) -> u64 {
        (0..n).sum()
    }

    #[tokio::test]
    async fn test_slow_step_times_out() {
        let guard = ExecutionGuard::new(Duration::from_millis(50));
        let result: Result<(), _> = guard
            .run("slow.md", |_deadline| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            })
            .await;
        match result {
            Err(DedupError::DocumentTimeout { document, .. }) => assert_eq!(document, "slow.md"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_guard_rearms_per_document() {
        let guard = ExecutionGuard::new(Duration::from_millis(100));

        let slow: Result<(), _> = guard
            .run("slow.md", |_| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;
        assert!(matches!(slow, Err(DedupError::DocumentTimeout { .. })));

        let next = guard
            .run("next.md", |deadline| async move {
                deadline.check()?;
                Ok::<_, DedupError>(deadline.document().to_string())
            })
            .await;
        assert_eq!(next.unwrap(), "next.md");
    }

    #[tokio::test]
    async fn test_blocking_worker_observes_deadline() {
        let guard = ExecutionGuard::new(Duration::from_millis(20));
        let result: Result<usize, _> = guard
            .run("busy.md", |deadline| {
                run_blocking(deadline, |deadline| {
                    let mut spins = 0usize;
                    while spins < 10_000 {
                        deadline.check()?;
                        std::thread::sleep(Duration::from_millis(5));
                        spins += 1;
                    }
                    Ok(spins)
                })
            })
            .await;
        assert!(matches!(result, Err(DedupError::DocumentTimeout { .. })));
    }

    #[tokio::test]
    async fn test_zero_budget_expires_immediately() {
        let deadline = Deadline::new("a.md", Duration::ZERO);
        assert!(deadline.is_expired());
        assert!(matches!(deadline.check(), Err(DedupError::DocumentTimeout { .. })));

        let guard = ExecutionGuard::new(Duration::ZERO);
        let result = guard
            .run("a.md", |deadline| run_blocking(deadline, |_| Ok(1)))
            .await;
        assert!(matches!(result, Err(DedupError::DocumentTimeout { .. })));
    }

    #[tokio::test]
    async fn test_worker_panic_is_isolated() {
        let guard = ExecutionGuard::new(Duration::from_secs(1));
        let result: Result<(), _> = guard
            .run("panic.md", |deadline| {
                run_blocking(deadline, |_| -> Result<(), DedupError> { panic!("worker exploded") })
            })
            .await;
        assert!(matches!(result, Err(DedupError::WorkerFailed { .. })));
    }
}
