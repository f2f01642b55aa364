//! LLM-backed candidate evaluator
//!
//! Rates every candidate of a stage in one provider call.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::generator::{render_context, truncate};
use super::provider::SharedProvider;
use super::retry::{RetryPolicy, generate_with_retry};
use super::validation::{split_lines, string_list};
use crate::plan::StageSpec;
use crate::search::{Candidate, CandidateEvaluator, Context, Verdict};
use crate::types::{Result, TotError};

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*[.):]").expect("valid regex"));

const RATING_INSTRUCTION: &str =
    "Rate each candidate as sure/maybe/impossible with regard to reaching the final goal.";

pub struct LlmEvaluator {
    provider: SharedProvider,
    retry: RetryPolicy,
}

impl LlmEvaluator {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_prompt(
        stage: &StageSpec,
        goal: &str,
        context: &Context,
        candidates: &[Candidate],
    ) -> String {
        let mut prompt = format!("Final goal: {}\n\n", goal);

        if !context.is_empty() {
            prompt.push_str("Accepted sections:\n\n");
            prompt.push_str(&render_context(context));
        }

        prompt.push_str(&format!("Candidates for \"{}\":\n\n", stage.name));
        for candidate in candidates {
            prompt.push_str(&format!("{}. {}\n\n", candidate.index + 1, candidate.text));
        }

        prompt.push_str(RATING_INSTRUCTION);
        prompt.push_str("\nGive exactly one rating per candidate, in order.");
        prompt
    }

    fn schema(count: usize) -> Value {
        json!({
            "type": "object",
            "properties": {
                "verdicts": {
                    "type": "array",
                    "items": {"type": "string", "enum": ["sure", "maybe", "impossible"]},
                    "minItems": count,
                    "maxItems": count
                }
            },
            "required": ["verdicts"]
        })
    }

    /// One verdict per rating.
    ///
    /// Structured lists are aligned by position, so surplus entries are
    /// dropped. Free text is only trusted while its ratings line up: a reply
    /// with more ratings than candidates is rejected. A shortfall is returned
    /// as-is for the engine to reject.
    fn parse_verdicts(stage: &StageSpec, content: &Value, count: usize) -> Result<Vec<Verdict>> {
        let ratings = match content {
            Value::String(text) => {
                let ratings = free_text_ratings(text);
                if ratings.len() > count {
                    return Err(TotError::evaluation(
                        &stage.name,
                        format!(
                            "{} ratings for {} candidates in free-text reply",
                            ratings.len(),
                            count
                        ),
                    ));
                }
                ratings
            }
            other => {
                let mut ratings = string_list(other, "verdicts").ok_or_else(|| {
                    TotError::evaluation(
                        &stage.name,
                        format!("unexpected response shape: {}", truncate(&other.to_string(), 200)),
                    )
                })?;
                if ratings.len() > count {
                    warn!(
                        stage = %stage.name,
                        expected = count,
                        actual = ratings.len(),
                        "Dropping surplus ratings"
                    );
                    ratings.truncate(count);
                }
                ratings
            }
        };

        ratings
            .iter()
            .map(|rating| {
                rating
                    .parse::<Verdict>()
                    .map_err(|e| TotError::evaluation(&stage.name, e))
            })
            .collect()
    }
}

/// Rating lines of a free-text reply.
///
/// Numbered lines win when present; otherwise lines that do not read as a
/// verdict (preamble, commentary) are skipped.
fn free_text_ratings(text: &str) -> Vec<String> {
    let lines = split_lines(text);
    let numbered: Vec<String> = lines
        .iter()
        .filter(|line| NUMBERED_LINE.is_match(line))
        .cloned()
        .collect();

    if !numbered.is_empty() {
        return numbered;
    }

    lines
        .into_iter()
        .filter(|line| {
            let rating = line.parse::<Verdict>().is_ok();
            if !rating {
                debug!(line = %line, "Skipping non-rating line");
            }
            rating
        })
        .collect()
}

#[async_trait]
impl CandidateEvaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        stage: &StageSpec,
        goal: &str,
        context: &Context,
        candidates: &[Candidate],
    ) -> Result<Vec<Verdict>> {
        let prompt = Self::build_prompt(stage, goal, context, candidates);
        let schema = Self::schema(candidates.len());
        let response =
            generate_with_retry(self.provider.as_ref(), &prompt, &schema, &self.retry).await?;

        let verdicts = Self::parse_verdicts(stage, &response.content, candidates.len())?;
        debug!(
            stage = %stage.name,
            verdicts = ?verdicts,
            tokens = response.usage.total(),
            "Rated candidates"
        );
        Ok(verdicts)
    }
}
