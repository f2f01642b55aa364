//! Timeout helpers
//!
//! Wraps async operations with a deadline and reports expiry as
//! [`TotError::Timeout`].

use std::future::Future;
use std::time::Duration;

use crate::types::{Result, TotError};

/// Execute an async operation with a timeout
///
/// ```ignore
/// let report = with_timeout(deadline, engine.run(), "search").await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(TotError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`], only applied when a deadline is set
pub async fn with_optional_timeout<T, F>(
    timeout: Option<Duration>,
    future: F,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(timeout) => with_timeout(timeout, future, operation_name).await,
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, TotError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, TotError>(42)
            },
            "slow search",
        )
        .await;
        match result {
            Err(TotError::Timeout { operation, .. }) => assert_eq!(operation, "slow search"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_without_deadline_runs_to_completion() {
        let result = with_optional_timeout(
            None,
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, TotError>("done")
            },
            "search",
        )
        .await;
        assert_eq!(result.unwrap(), "done");
    }
}
