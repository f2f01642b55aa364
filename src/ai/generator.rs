//! LLM-backed candidate generator
//!
//! Asks the provider for alternative versions of the current stage's
//! fragment, conditioned on the goal and the fragments accepted so far.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::provider::SharedProvider;
use super::retry::{RetryPolicy, generate_with_retry};
use super::validation::{split_blocks, string_list};
use crate::constants::prompt as prompt_constants;
use crate::plan::StageSpec;
use crate::search::{CandidateGenerator, Context};
use crate::types::{Result, TotError};

pub struct LlmGenerator {
    provider: SharedProvider,
    goal: String,
    retry: RetryPolicy,
}

impl LlmGenerator {
    pub fn new(provider: SharedProvider, goal: impl Into<String>) -> Self {
        Self {
            provider,
            goal: goal.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_prompt(&self, stage: &StageSpec, context: &Context, limit: usize) -> String {
        let mut prompt = format!("Goal: {}\n\n", self.goal);

        if !context.is_empty() {
            prompt.push_str("Sections written so far:\n\n");
            prompt.push_str(&render_context(context));
        }

        prompt.push_str(&format!(
            "Write up to {} alternative versions of the next section, \"{}\".\n",
            limit, stage.name
        ));
        if !stage.instructions.trim().is_empty() {
            prompt.push_str(&format!("\n{}\n", stage.instructions.trim()));
        }
        prompt.push_str("\nSeparate alternatives with a blank line.");
        prompt
    }

    fn schema(limit: usize) -> Value {
        json!({
            "type": "object",
            "properties": {
                "candidates": {
                    "type": "array",
                    "items": {"type": "string"},
                    "maxItems": limit
                }
            },
            "required": ["candidates"]
        })
    }

    fn parse_candidates(stage: &StageSpec, content: &Value, limit: usize) -> Result<Vec<String>> {
        let candidates = match content {
            Value::String(text) => split_blocks(text),
            other => string_list(other, "candidates").ok_or_else(|| {
                TotError::generation(
                    &stage.name,
                    format!("unexpected response shape: {}", truncate(&other.to_string(), 200)),
                )
            })?,
        };

        Ok(candidates
            .into_iter()
            .filter(|c| !c.is_empty())
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl CandidateGenerator for LlmGenerator {
    async fn generate(
        &self,
        stage: &StageSpec,
        context: &Context,
        limit: usize,
    ) -> Result<Vec<String>> {
        let prompt = self.build_prompt(stage, context, limit);
        let response =
            generate_with_retry(self.provider.as_ref(), &prompt, &Self::schema(limit), &self.retry)
                .await?;

        debug!(
            stage = %stage.name,
            tokens = response.usage.total(),
            elapsed_ms = response.timing.total_ms,
            "Generated candidates"
        );
        Self::parse_candidates(stage, &response.content, limit)
    }
}

/// Accepted fragments as markdown sections, each capped in length
pub(crate) fn render_context(context: &Context) -> String {
    context
        .iter()
        .map(|(name, fragment)| {
            format!(
                "## {}\n{}\n\n",
                name,
                truncate(fragment, prompt_constants::MAX_FRAGMENT_CHARS)
            )
        })
        .collect()
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
