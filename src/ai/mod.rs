//! AI Integration Layer
//!
//! LLM providers plus the generator and evaluator that put them behind
//! the search collaborator traits.

pub mod evaluator;
pub mod generator;
pub mod provider;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use evaluator::LlmEvaluator;
pub use generator::LlmGenerator;
pub use provider::{
    ClaudeCodeProvider, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ProviderConfig,
    SharedProvider, TokenUsage, create_provider,
};
pub use retry::{RetryPolicy, generate_with_retry};
pub use timeout::{with_optional_timeout, with_timeout};
pub use validation::{JsonRepairer, extract_json_from_response};
