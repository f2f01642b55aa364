//! JSON extraction for LLM responses
//!
//! Models asked for JSON still wrap it in fences, leave trailing commas,
//! stop before the last closer, or talk around it. Repairs are tried from
//! cheapest to most invasive.

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{ErrorCategory, LlmError, Result};

/// Extract and parse JSON from an LLM response
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonRepairer::new()
        .parse_or_repair(content)
        .map(|(value, _)| value)
}

#[derive(Debug, Clone, Copy)]
enum Repair {
    TrailingCommas,
    Unclosed,
    Embedded,
}

#[derive(Debug, Default)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Parse JSON, repairing if the first parse fails.
    ///
    /// Returns `(value, was_repaired)`.
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        let cleaned = Self::preprocess(raw);

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok((value, false));
        }
        debug!("Initial JSON parse failed, attempting repair");

        for repair in [Repair::TrailingCommas, Repair::Unclosed, Repair::Embedded] {
            let Some(candidate) = Self::apply(repair, &cleaned) else {
                continue;
            };
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                warn!(?repair, "Repaired malformed JSON from LLM");
                return Ok((value, true));
            }
        }

        Err(LlmError::new(
            ErrorCategory::ParseError,
            format!(
                "Response is not valid JSON: {}...",
                cleaned.chars().take(200).collect::<String>()
            ),
        )
        .into())
    }

    fn apply(repair: Repair, s: &str) -> Option<String> {
        match repair {
            Repair::TrailingCommas => Some(Self::strip_trailing_commas(s)),
            Repair::Unclosed => Some(Self::close_open(&Self::strip_trailing_commas(s))),
            Repair::Embedded => Self::extract_embedded(s),
        }
    }

    fn preprocess(raw: &str) -> String {
        let mut s = raw.trim().trim_start_matches('\u{feff}');

        if s.starts_with("```")
            && let Some(newline) = s.find('\n')
        {
            s = &s[newline + 1..];
        }
        if let Some(stripped) = s.trim_end().strip_suffix("```") {
            s = stripped;
        }

        s.trim().to_string()
    }

    fn strip_trailing_commas(s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
            } else if ch == '\\' && in_string {
                escape = true;
            } else if ch == '"' {
                in_string = !in_string;
            } else if ch == ',' && !in_string {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']') | Some('}')) {
                    continue;
                }
            }
            result.push(ch);
        }

        result
    }

    /// Close an unterminated string and any open brackets, innermost first
    fn close_open(s: &str) -> String {
        let mut open = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => open.push('}'),
                '[' if !in_string => open.push(']'),
                '}' | ']' if !in_string => {
                    open.pop();
                }
                _ => {}
            }
        }

        let mut result = s.to_string();
        if in_string {
            result.push('"');
        }
        result.extend(open.into_iter().rev());
        result
    }

    /// First balanced object or array inside surrounding prose
    fn extract_embedded(s: &str) -> Option<String> {
        let start = s.find(['{', '['])?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' | '[' if !in_string => depth += 1,
                '}' | ']' if !in_string => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(s[start..start + i + 1].to_string());
                    }
                }
                _ => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TotError;

    #[test]
    fn test_parse_valid_json() {
        let (_, repaired) = JsonRepairer::new()
            .parse_or_repair(r#"{"candidates": ["a"]}"#)
            .unwrap();
        assert!(!repaired);
    }

    #[test]
    fn test_strip_code_fences() {
        let input = "```json\n{\"verdicts\": [\"sure\"]}\n```";
        let value = extract_json_from_response(input).unwrap();
        assert_eq!(value["verdicts"][0], "sure");
    }

    #[test]
    fn test_fix_trailing_comma() {
        let input = r#"{"candidates": ["a", "b",]}"#;
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert_eq!(value["candidates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_comma_inside_string_kept() {
        let input = r#"{"candidates": ["Rust, Go ]",]}"#;
        let value = extract_json_from_response(input).unwrap();
        assert_eq!(value["candidates"][0], "Rust, Go ]");
    }

    #[test]
    fn test_close_truncated_output() {
        let input = r#"{"candidates": ["BSc Physics", "MSc Comp"#;
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert_eq!(value["candidates"][1], "MSc Comp");
    }

    #[test]
    fn test_extract_from_prose() {
        let input = "Here are my ratings:\n{\"verdicts\": [\"maybe\", \"sure\"]}\nGood luck!";
        let value = extract_json_from_response(input).unwrap();
        assert_eq!(value["verdicts"][1], "sure");
    }

    #[test]
    fn test_unrepairable_is_parse_error() {
        let err = extract_json_from_response("no json at all").unwrap_err();
        match err {
            TotError::Llm(e) => assert_eq!(e.category, ErrorCategory::ParseError),
            other => panic!("unexpected error: {other}"),
        }
    }
}
