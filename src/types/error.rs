//! Unified Error Type System
//!
//! Centralized error types for the search engine, its LLM collaborators and
//! the CLI. Provider failures are classified so the collaborators can decide
//! whether a call is worth retrying.
//!
//! ## Error Kinds
//!
//! - **Plan misuse**: `IndexOutOfRange`, `InvalidDepth` (fatal, never retried)
//! - **Collaborator failure**: `Generation`, `Evaluation` (propagated as a failed search)
//! - **Contract violation**: `EvaluationContract` (broken evaluator, fatal)
//! - **Run control**: `Cancelled`, `Timeout`
//!
//! Exhaustion is not an error: it is reported as `SearchResult::Exhausted`.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider error categories for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Context/token limit exceeded
    TokenLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Provider unavailable
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Parsing LLM response failed - may retry
    ParseError,
    /// Temporary server issues - retry
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable on the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::ParseError
        )
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw provider failures onto an [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        let category = if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
        {
            ErrorCategory::RateLimit
        } else if lower.contains("context length") || lower.contains("too large") {
            ErrorCategory::TokenLimit
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
        {
            ErrorCategory::Auth
        } else if lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("dns")
        {
            ErrorCategory::Network
        } else if lower.contains("not installed") || lower.contains("not found") {
            ErrorCategory::Unavailable
        } else if lower.contains("parse") || lower.contains("json") {
            ErrorCategory::ParseError
        } else if lower.contains("overloaded")
            || lower.contains("temporary")
            || lower.contains("non-zero status")
        {
            ErrorCategory::Transient
        } else {
            ErrorCategory::Unknown
        };

        LlmError::with_provider(category, message, provider)
    }

    /// Classify an HTTP status code directly
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 => ErrorCategory::BadRequest,
            500 | 502 | 503 | 504 => ErrorCategory::Transient,
            404 => ErrorCategory::Unavailable,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum TotError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Classified provider error
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Unclassified provider error
    #[error("LLM API error: {0}")]
    LlmApi(String),

    // -------------------------------------------------------------------------
    // Plan Errors
    // -------------------------------------------------------------------------
    #[error("Stage index {index} out of range (plan has {len} stages)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Max depth {requested} exceeds plan size of {stages} stages")]
    InvalidDepth { requested: usize, stages: usize },

    // -------------------------------------------------------------------------
    // Search Errors
    // -------------------------------------------------------------------------
    #[error("Candidate generation failed at stage '{stage}': {message}")]
    Generation { stage: String, message: String },

    #[error("Candidate evaluation failed at stage '{stage}': {message}")]
    Evaluation { stage: String, message: String },

    #[error(
        "Evaluator returned {actual} verdicts for {expected} candidates at stage '{stage}'"
    )]
    EvaluationContract {
        stage: String,
        expected: usize,
        actual: usize,
    },

    #[error("Search cancelled at stage '{stage}'")]
    Cancelled { stage: String },

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl From<LlmError> for TotError {
    fn from(err: LlmError) -> Self {
        TotError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, TotError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl TotError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn generation(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn evaluation(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Check if a provider call that failed with this error can be retried
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_retryable(),
            Self::LlmApi(msg) => ErrorClassifier::classify(msg, "unknown").is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Errors produced by a collaborator rather than by the engine itself
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::Evaluation { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
    }

    #[test]
    fn test_classify_messages() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "openai");
        assert_eq!(err.category, ErrorCategory::RateLimit);

        let err = ErrorClassifier::classify("Invalid API key provided", "openai");
        assert_eq!(err.category, ErrorCategory::Auth);

        let err = ErrorClassifier::classify("Connection refused", "ollama");
        assert_eq!(err.category, ErrorCategory::Network);

        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(
            ErrorClassifier::classify_http_status(429, "slow down", "t").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(503, "down", "t").category,
            ErrorCategory::Transient
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(401, "nope", "t").category,
            ErrorCategory::Auth
        );
    }

    #[test]
    fn test_recoverable() {
        let transient: TotError = LlmError::new(ErrorCategory::Transient, "busy").into();
        assert!(transient.is_recoverable());

        let contract = TotError::EvaluationContract {
            stage: "skills".into(),
            expected: 2,
            actual: 1,
        };
        assert!(!contract.is_recoverable());
        assert!(!contract.is_collaborator_failure());
        assert!(TotError::generation("skills", "boom").is_collaborator_failure());
    }

    #[test]
    fn test_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err = TotError::IndexOutOfRange { index: 7, len: 5 };
        assert_eq!(
            err.to_string(),
            "Stage index 7 out of range (plan has 5 stages)"
        );
    }
}
