//! Prompt building utilities for LLM providers.

use serde_json::Value;

pub const SYSTEM_PROMPT: &str =
    "You are a careful writing assistant. Write concise, factual text without placeholders.";

/// System prompt demanding JSON that matches `schema`
pub fn schema_system_prompt(schema: &Value) -> String {
    format!(
        "{}\n\nAlways respond with valid JSON matching this schema:\n\n```json\n{}\n```\n\nRespond ONLY with valid JSON, no explanation.",
        SYSTEM_PROMPT,
        pretty_schema(schema)
    )
}

/// Append JSON schema instructions to a user prompt.
///
/// Used by providers without a separate system channel. Returns the
/// original prompt if schema is null.
pub fn build_schema_prompt(user_prompt: &str, schema: &Value) -> String {
    if schema.is_null() {
        return user_prompt.to_string();
    }

    format!(
        "{}\n\n---\n\nRespond with valid JSON matching this schema:\n```json\n{}\n```\n\nRespond ONLY with valid JSON, no explanation.",
        user_prompt,
        pretty_schema(schema)
    )
}

fn pretty_schema(schema: &Value) -> String {
    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_schema_prompt_null_schema() {
        let prompt = "Write the education section";
        assert_eq!(build_schema_prompt(prompt, &Value::Null), prompt);
    }

    #[test]
    fn test_build_schema_prompt_with_schema() {
        let prompt = "Write the education section";
        let schema = json!({"type": "object", "properties": {"candidates": {"type": "array"}}});
        let result = build_schema_prompt(prompt, &schema);

        assert!(result.starts_with(prompt));
        assert!(result.contains("\"candidates\""));
    }

    #[test]
    fn test_schema_system_prompt() {
        let result = schema_system_prompt(&json!({"type": "object"}));
        assert!(result.starts_with(SYSTEM_PROMPT));
        assert!(result.contains("\"object\""));
    }
}
