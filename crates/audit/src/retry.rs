use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use pagepilot_core_types::{RunId, ToolRecordId};

use crate::api::{AuditRecorder, RunRecord, RunStatus, ToolRecord, ToolStatus};
use crate::errors::AuditError;

/// Bounded retry with exponential backoff for transient persistence errors.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2,
        }
    }
}

/// Run `op` up to `policy.attempts` times, sleeping between attempts with
/// exponential backoff. Non-transient errors abort immediately; the final
/// error is surfaced, never swallowed.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T, AuditError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AuditError>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.initial_delay;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                warn!(label, attempt, %err, "audit operation failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= policy.backoff_factor;
            }
            Err(err) => {
                warn!(label, attempt, %err, "audit operation failed after max retries");
                return Err(err);
            }
        }
    }
    unreachable!("retry loop always returns")
}

/// Recorder wrapper applying [`with_retry`] to every operation.
pub struct Retrying<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R> Retrying<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[async_trait]
impl<R: AuditRecorder> AuditRecorder for Retrying<R> {
    async fn create_run(&self, goal: &str) -> Result<RunRecord, AuditError> {
        with_retry(self.policy, "create_run", || self.inner.create_run(goal)).await
    }

    async fn update_run_status(&self, run: &RunId, status: RunStatus) -> Result<(), AuditError> {
        with_retry(self.policy, "update_run_status", || {
            self.inner.update_run_status(run, status)
        })
        .await
    }

    async fn create_tool(
        &self,
        run: &RunId,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolRecord, AuditError> {
        with_retry(self.policy, "create_tool", || {
            self.inner.create_tool(run, name, args.clone())
        })
        .await
    }

    async fn update_tool_status(
        &self,
        tool: &ToolRecordId,
        status: ToolStatus,
        result: Option<serde_json::Value>,
    ) -> Result<(), AuditError> {
        with_retry(self.policy, "update_tool_status", || {
            self.inner.update_tool_status(tool, status, result.clone())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn transient_errors_retry_then_succeed() {
        let calls = AtomicU32::new(0);
        let result = with_retry(RetryPolicy::default(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AuditError::Unavailable("flaky".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_the_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AuditError::Unavailable("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_do_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AuditError::RunNotFound("gone".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
