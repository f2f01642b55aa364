//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global and project (.totwriter/) level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::provider::ProviderConfig;
use crate::constants::{network, retry, search as search_constants};
use crate::search::SuccessBoundary;
use crate::types::{Result, TotError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Search engine settings
    pub search: SearchConfig,

    /// Stage plan definition
    pub plan: PlanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            plan: PlanConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `TotError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TotError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(TotError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(1..=search_constants::MAX_CANDIDATES_LIMIT).contains(&self.search.max_candidates) {
            return Err(TotError::Config(format!(
                "search max_candidates must be between 1 and {}, got {}",
                search_constants::MAX_CANDIDATES_LIMIT,
                self.search.max_candidates
            )));
        }

        if self.search.deadline_secs == Some(0) {
            return Err(TotError::Config(
                "search deadline_secs must be greater than 0".to_string(),
            ));
        }

        for stage in &self.plan.stages {
            if stage.name.trim().is_empty() {
                return Err(TotError::Config(
                    "plan stage names must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "claude-code", "openai", "ollama"
    pub provider: String,

    /// Model name
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation; candidates benefit from some variety
    pub temperature: f32,

    /// Custom API endpoint
    pub api_base: Option<String>,

    /// Maximum tokens per completion
    pub max_tokens: usize,

    /// Retries per generator/evaluator call on transient failures
    pub max_retries: usize,
}

const DEFAULT_PROVIDER: &str = "claude-code";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 1.0,
            api_base: None,
            max_tokens: network::DEFAULT_MAX_TOKENS,
            max_retries: retry::DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    /// Model to request, if any.
    ///
    /// The built-in Claude model is only meaningful for the built-in provider;
    /// other providers fall back to their own default model.
    fn effective_model(&self) -> Option<String> {
        let foreign_default = self.model == DEFAULT_MODEL && self.provider != DEFAULT_PROVIDER;
        (!self.model.is_empty() && !foreign_default).then(|| self.model.clone())
    }

    /// Provider settings; the API key is resolved by each provider from its env var
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.effective_model(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: None,
            api_base: self.api_base.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

// =============================================================================
// Search Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Branching cap per stage
    pub max_candidates: usize,

    /// Initial lookahead budget; defaults to the plan's stage count
    pub max_depth: Option<usize>,

    /// Where a path counts as complete
    pub boundary: SuccessBoundary,

    /// Overall deadline for one search run
    pub deadline_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_candidates: search_constants::MAX_CANDIDATES,
            max_depth: None,
            boundary: SuccessBoundary::Plan,
            deadline_secs: None,
        }
    }
}

// =============================================================================
// Plan Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Overall goal shown to the evaluator; empty uses the built-in goal
    pub goal: String,

    /// Ordered stages; empty uses the built-in resume plan
    pub stages: Vec<StageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Key under which the accepted fragment is stored
    pub name: String,

    /// Instructions passed to the generator
    #[serde(default)]
    pub instructions: String,
}

// =============================================================================
// Tests
// =============================================================================
