//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait the generator and evaluator talk to.
//! All providers return `LlmResponse` with token usage for logging.

mod claude_code;
mod ollama;
mod openai;
mod prompt_utils;

pub use claude_code::ClaudeCodeProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::constants::network;
use crate::types::{Result, TotError};

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// LLM response content plus usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated content (JSON, or a JSON string for free text)
    pub content: Value,
    pub usage: TokenUsage,
    /// Cost in USD when the provider reports it
    pub cost_usd: f64,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage/cost unknown)
    pub fn content_only(content: Value) -> Self {
        Self {
            content,
            usage: TokenUsage::default(),
            cost_usd: 0.0,
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Wall clock time in milliseconds
    pub total_ms: u64,
    /// Provider-reported processing time
    pub api_ms: Option<u64>,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
            api_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared LLM provider type
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// API keys are never serialized and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "claude-code", "openai", "ollama"
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "claude-code".to_string(),
            model: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 1.0,
            api_key: None,
            api_base: None,
            max_tokens: network::DEFAULT_MAX_TOKENS,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate output for `prompt`; `schema` describes the expected JSON
    /// shape, or is `Value::Null` for free text.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "claude-code" => Ok(Arc::new(ClaudeCodeProvider::new(config.clone()))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(TotError::Config(format!(
            "Unknown provider: {}. Supported: claude-code, openai, ollama",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> ProviderConfig {
        ProviderConfig {
            provider: provider.to_string(),
            model: None,
            timeout_secs: 30,
            temperature: 0.7,
            api_key: Some("sk-secret".to_string()),
            api_base: None,
            max_tokens: 256,
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let debug = format!("{:?}", config("openai"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let json = serde_json::to_string(&config("openai")).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_create_provider() {
        let provider = create_provider(&config("claude-code")).unwrap();
        assert_eq!(provider.name(), "claude-code");

        let provider = create_provider(&config("ollama")).unwrap();
        assert_eq!(provider.name(), "ollama");

        assert!(matches!(
            create_provider(&config("gpt-neo")),
            Err(TotError::Config(_))
        ));
    }

    #[test]
    fn test_token_usage_total() {
        assert_eq!(TokenUsage::new(100, 50).total(), 150);
    }
}
