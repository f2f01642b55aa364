//! Ollama Local LLM Provider

use async_trait::async_trait;
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

const PROVIDER: &str = "ollama";
const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:latest";

/// Ollama Local LLM Provider
pub struct OllamaProvider {
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Self::validate_endpoint(&api_base)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TotError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Only http/https endpoints are accepted; non-local hosts are logged.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            TotError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(TotError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]")
        {
            warn!("Ollama endpoint is not localhost: {}", host);
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    fn build_request(&self, prompt: &str, schema: &Value) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            prompt: prompt_utils::build_schema_prompt(prompt, schema),
            system: prompt_utils::SYSTEM_PROMPT.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
            format: (!schema.is_null()).then(|| "json".to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        info!(
            "Generating with Ollama (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let request = self.build_request(prompt, schema);
        let url = format!("{}/api/generate", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::with_provider(
                        ErrorCategory::Network,
                        format!(
                            "Failed to connect to Ollama at {}. Is Ollama running?",
                            self.api_base
                        ),
                        PROVIDER,
                    )
                } else {
                    ErrorClassifier::classify(&format!("Ollama request failed: {}", e), PROVIDER)
                }
            })?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Ollama API error ({}): {}", status, body),
                PROVIDER,
            )
            .into());
        }

        let body: OllamaResponse = response.json().await.map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to parse Ollama response: {}", e),
                PROVIDER,
            )
        })?;

        let usage = TokenUsage::new(
            body.prompt_eval_count.unwrap_or(0),
            body.eval_count.unwrap_or(0),
        );

        debug!(tokens = usage.total(), "Received response from Ollama");
        let content = if schema.is_null() {
            Value::String(body.response)
        } else {
            extract_json_from_response(&body.response)?
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
        let url = format!("{}/api/tags", self.api_base);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let Ok(tags) = resp.json::<OllamaTagsResponse>().await else {
                    return Ok(true);
                };
                let base = self.model.trim_end_matches(":latest");
                let available = tags
                    .models
                    .iter()
                    .any(|m| m.name == self.model || m.name.starts_with(base));
                if !available {
                    warn!(
                        "Ollama is running but model '{}' not found. Pull with: ollama pull {}",
                        self.model, self.model
                    );
                }
                Ok(available)
            }
            Ok(resp) => {
                warn!("Ollama API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Ollama not available: {}. Start with: ollama serve", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ProviderConfig {
        ProviderConfig {
            provider: PROVIDER.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let provider = OllamaProvider::new(config()).unwrap();
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let config = ProviderConfig {
            api_base: Some("file:///etc/passwd".to_string()),
            ..config()
        };
        assert!(matches!(
            OllamaProvider::new(config),
            Err(TotError::Config(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ProviderConfig {
            api_base: Some("http://localhost:11434/".to_string()),
            ..config()
        };
        let provider = OllamaProvider::new(config).unwrap();
        assert_eq!(provider.api_base, "http://localhost:11434");
    }

    #[test]
    fn test_json_format_only_with_schema() {
        let provider = OllamaProvider::new(config()).unwrap();
        assert!(provider.build_request("p", &Value::Null).format.is_none());
        let request = provider.build_request("p", &json!({"type": "object"}));
        assert_eq!(request.format.as_deref(), Some("json"));
        assert!(request.prompt.contains("schema"));
    }
}
