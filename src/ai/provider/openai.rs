//! OpenAI API Provider
//!
//! LLM provider using OpenAI's Chat Completions API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, TokenUsage,
    prompt_utils,
};
use crate::ai::validation::extract_json_from_response;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, TotError};

const PROVIDER: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                TotError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var".to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TotError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &str, schema: &Value) -> ChatCompletionRequest {
        let json_mode = !schema.is_null();
        let system_content = if json_mode {
            prompt_utils::schema_system_prompt(schema)
        } else {
            prompt_utils::SYSTEM_PROMPT.to_string()
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_content,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let request = self.build_request(prompt, schema);
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let category = if e.is_timeout() || e.is_connect() {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Unknown
                };
                LlmError::with_provider(category, format!("request failed: {}", e), PROVIDER)
            })?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, body),
                PROVIDER,
            )
            .into());
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to parse OpenAI response: {}", e),
                PROVIDER,
            )
        })?;

        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TotError::LlmApi("No content in OpenAI response".to_string()))?;

        debug!(tokens = usage.total(), "Received response from OpenAI");
        let content = if schema.is_null() {
            Value::String(text.clone())
        } else {
            extract_json_from_response(text)?
        };

        Ok(LlmResponse {
            content,
            usage,
            cost_usd: 0.0,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(ProviderConfig {
            provider: PROVIDER.to_string(),
            model: None,
            timeout_secs: 10,
            temperature: 0.9,
            api_key: Some("sk-test".to_string()),
            api_base: Some("http://localhost:9".to_string()),
            max_tokens: 128,
        })
        .unwrap()
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains(DEFAULT_MODEL));
    }

    #[test]
    fn test_json_mode_only_with_schema() {
        let p = provider();
        let free = p.build_request("hi", &Value::Null);
        assert!(free.response_format.is_none());

        let structured = p.build_request("hi", &json!({"type": "object"}));
        assert!(structured.response_format.is_some());
        assert!(structured.messages[0].content.contains("schema"));
    }
}
