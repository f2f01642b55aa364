//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Search engine constants
pub mod search {
    /// Maximum candidates considered per stage (branching factor cap)
    pub const MAX_CANDIDATES: usize = 5;

    /// Upper bound on configurable branching factor
    pub const MAX_CANDIDATES_LIMIT: usize = 20;
}

/// Provider call retry constants
pub mod retry {
    /// Default retries per collaborator call
    pub const DEFAULT_MAX_RETRIES: usize = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;
}

/// Network constants
pub mod network {
    /// Default LLM request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Default max tokens per completion
    pub const DEFAULT_MAX_TOKENS: usize = 1024;
}

/// Prompt constants
pub mod prompt {
    /// Maximum characters of a single accepted fragment echoed back into prompts
    pub const MAX_FRAGMENT_CHARS: usize = 2000;
}
