//! Retry policy for provider calls
//!
//! Exponential backoff with jitter; only errors classified as recoverable
//! are retried.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use serde_json::Value;
use tracing::warn;

use super::provider::{LlmProvider, LlmResponse};
use crate::constants::retry as retry_constants;
use crate::types::{Result, TotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry_constants::DEFAULT_MAX_RETRIES,
            min_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry_constants::MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self::with_max_retries(0)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Call `provider.generate`, retrying recoverable failures per `policy`
pub async fn generate_with_retry(
    provider: &dyn LlmProvider,
    prompt: &str,
    schema: &Value,
    policy: &RetryPolicy,
) -> Result<LlmResponse> {
    (|| provider.generate(prompt, schema))
        .retry(policy.backoff())
        .when(|e: &TotError| e.is_recoverable())
        .notify(|e: &TotError, delay: Duration| {
            warn!(
                provider = provider.name(),
                delay_ms = delay.as_millis() as u64,
                "Provider call failed, retrying: {}",
                e
            );
        })
        .await
}

#[cfg(test)]
pub(crate) mod testing {
    //! Provider stub replaying canned responses.

    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct FakeProvider {
        replies: Mutex<Vec<Result<Value>>>,
        pub prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        /// Replies are handed out in order; the last one repeats
        pub fn new(replies: Vec<Result<Value>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn replying(content: Value) -> Self {
            Self::new(vec![Ok(content)])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_prompt(&self) -> String {
            self.prompts
                .lock()
                .ok()
                .and_then(|p| p.last().cloned())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        async fn generate(&self, prompt: &str, _schema: &Value) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            let mut replies = self.replies.lock().expect("replies lock");
            let reply = if replies.len() > 1 {
                replies.remove(0)
            } else {
                match replies.first() {
                    Some(Ok(value)) => Ok(value.clone()),
                    Some(Err(e)) => Err(TotError::LlmApi(e.to_string())),
                    None => Err(TotError::LlmApi("no reply scripted".to_string())),
                }
            };
            reply.map(LlmResponse::content_only)
        }

        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeProvider;
    use super::*;
    use crate::types::{ErrorCategory, LlmError};
    use serde_json::json;

    fn fast(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn failure(category: ErrorCategory) -> Result<Value> {
        Err(LlmError::new(category, "scripted failure").into())
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let provider = FakeProvider::new(vec![
            failure(ErrorCategory::Transient),
            failure(ErrorCategory::RateLimit),
            Ok(json!({"candidates": ["a"]})),
        ]);

        let response = generate_with_retry(&provider, "p", &Value::Null, &fast(3))
            .await
            .unwrap();
        assert_eq!(response.content["candidates"][0], "a");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_auth_failure() {
        let provider = FakeProvider::new(vec![
            failure(ErrorCategory::Auth),
            Ok(json!({"candidates": ["a"]})),
        ]);

        let result = generate_with_retry(&provider, "p", &Value::Null, &fast(3)).await;
        assert!(matches!(result, Err(TotError::Llm(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let provider = FakeProvider::new(vec![
            failure(ErrorCategory::Network),
            failure(ErrorCategory::Network),
            failure(ErrorCategory::Network),
            Ok(json!("late")),
        ]);

        let result = generate_with_retry(&provider, "p", &Value::Null, &fast(1)).await;
        assert!(result.is_err());
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, retry_constants::DEFAULT_MAX_RETRIES);
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
