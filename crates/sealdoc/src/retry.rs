//! Deadlines and retries for network steps.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::error::{DocShareError, Result};

/// Run `fut` with a deadline, converting its error into [`DocShareError`].
pub async fn with_timeout<T, E, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<DocShareError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(operation, ?limit, "deadline exceeded");
            Err(DocShareError::Timeout {
                operation,
                after: limit,
            })
        }
    }
}

/// Run `attempt` until it succeeds, fails permanently, or the policy is spent.
///
/// Only errors for which [`DocShareError::is_retryable`] holds are retried.
/// Callers must only pass idempotent operations.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut n = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && n < policy.max_attempts => {
                let delay = policy.backoff(n);
                tracing::warn!(operation, attempt = n, ?delay, error = %e, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
