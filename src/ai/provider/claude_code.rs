//! Claude Code CLI Provider
//!
//! Runs prompts through the local `claude` CLI in print mode.
//! Single-shot: retries are the caller's business.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, TokenUsage,
};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, TotError};

const PROVIDER: &str = "claude-code";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub struct ClaudeCodeProvider {
    model: String,
    timeout_secs: u64,
    temperature: f32,
}

impl ClaudeCodeProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
        }
    }

    async fn execute(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        let start_time = Instant::now();

        let mut cmd = Command::new("claude");
        cmd.arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.model)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !schema.is_null() {
            cmd.arg("--json-schema").arg(serde_json::to_string(schema)?);
        }

        cmd.env("CLAUDE_CODE_TEMPERATURE", self.temperature.to_string());

        let child = cmd.spawn().map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::Unavailable,
                format!("Failed to spawn Claude Code CLI: {}. Is it installed?", e),
                PROVIDER,
            )
        })?;

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            LlmError::with_provider(
                ErrorCategory::Network,
                format!("Claude Code timed out after {}s", self.timeout_secs),
                PROVIDER,
            )
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::failure(&stdout, &stderr).into());
        }

        self.parse_output(&stdout, schema, start_time.elapsed())
    }

    /// Classify a non-zero exit, preferring the API error the CLI reports on stdout
    fn failure(stdout: &str, stderr: &str) -> LlmError {
        if let Ok(response) = serde_json::from_str::<Value>(stdout)
            && response
                .get("is_error")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        {
            let message = response
                .get("result")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown API error");
            return ErrorClassifier::classify(message, PROVIDER);
        }

        let message = if stderr.trim().is_empty() {
            "Process exited with non-zero status"
        } else {
            stderr.trim()
        };
        ErrorClassifier::classify(message, PROVIDER)
    }

    fn parse_output(&self, stdout: &str, schema: &Value, elapsed: Duration) -> Result<LlmResponse> {
        let response: Value = serde_json::from_str(stdout).map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to parse Claude Code output: {}", e),
                PROVIDER,
            )
        })?;

        let content = match (response.get("structured_output"), response.get("result")) {
            (Some(structured), _) if !schema.is_null() => structured.clone(),
            (_, Some(Value::String(text))) if schema.is_null() => Value::String(text.clone()),
            (_, Some(Value::String(text))) => {
                serde_json::from_str(text).unwrap_or_else(|e| {
                    debug!("Result is not JSON, keeping raw text: {}", e);
                    Value::String(text.clone())
                })
            }
            (_, Some(result)) if result.is_object() || result.is_array() => result.clone(),
            _ => {
                return Err(TotError::LlmApi(
                    "No result in Claude Code response".to_string(),
                ));
            }
        };

        let usage = response.get("usage");
        let count = |key: &str| {
            usage
                .and_then(|u| u.get(key))
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32
        };

        Ok(LlmResponse {
            content,
            usage: TokenUsage::new(count("input_tokens"), count("output_tokens")),
            cost_usd: response
                .get("total_cost_usd")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
            timing: ResponseTiming {
                total_ms: elapsed.as_millis() as u64,
                api_ms: response.get("duration_api_ms").and_then(|v| v.as_u64()),
            },
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER.to_string(),
            },
        })
    }
}

#[async_trait]
impl LlmProvider for ClaudeCodeProvider {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        info!(
            "Generating with Claude Code CLI (model: {}, temperature: {})",
            self.model, self.temperature
        );
        self.execute(prompt, schema).await
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let output = Command::new("claude")
            .arg("--version")
            .output()
            .await
            .map_err(|e| TotError::LlmApi(format!("Claude Code not found: {}", e)))?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("Claude Code CLI available: {}", version.trim());
        }
        Ok(output.status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> ClaudeCodeProvider {
        ClaudeCodeProvider::new(ProviderConfig::default())
    }

    #[tokio::test]
    #[ignore = "requires claude CLI installed"]
    async fn test_health_check() {
        assert!(provider().health_check().await.is_ok());
    }

    #[test]
    fn test_parse_structured_output() {
        let stdout = json!({
            "structured_output": {"candidates": ["a", "b"]},
            "result": "ignored",
            "total_cost_usd": 0.0125,
            "usage": {"input_tokens": 1000, "output_tokens": 500}
        })
        .to_string();

        let response = provider()
            .parse_output(&stdout, &json!({"type": "object"}), Duration::from_millis(5))
            .unwrap();
        assert_eq!(response.content["candidates"][1], "b");
        assert_eq!(response.usage.total(), 1500);
        assert!((response.cost_usd - 0.0125).abs() < 1e-9);
    }

    #[test]
    fn test_parse_free_text_keeps_string() {
        let stdout = json!({"result": "{\"looks\": \"like json\"}"}).to_string();
        let response = provider()
            .parse_output(&stdout, &Value::Null, Duration::ZERO)
            .unwrap();
        assert!(response.content.is_string());
    }

    #[test]
    fn test_parse_json_result_string() {
        let stdout = json!({"result": "{\"verdicts\": [\"sure\"]}"}).to_string();
        let response = provider()
            .parse_output(&stdout, &json!({"type": "object"}), Duration::ZERO)
            .unwrap();
        assert_eq!(response.content["verdicts"][0], "sure");
    }

    #[test]
    fn test_failure_classification() {
        let stdout = json!({"is_error": true, "result": "Rate limit reached"}).to_string();
        let err = ClaudeCodeProvider::failure(&stdout, "");
        assert_eq!(err.category, ErrorCategory::RateLimit);

        let err = ClaudeCodeProvider::failure("", "");
        assert_eq!(err.category, ErrorCategory::Transient);
    }
}
