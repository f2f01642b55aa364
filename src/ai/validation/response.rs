//! Response shape helpers
//!
//! Structured responses carry a named string array; free-text responses
//! are split into items by blank lines (candidates) or by lines (ratings).

use serde_json::Value;

/// Items of the array under `key`, or of `content` itself when it is an array.
///
/// Non-string items are rendered as JSON. Returns `None` for any other shape.
pub fn string_list(content: &Value, key: &str) -> Option<Vec<String>> {
    let items = match content {
        Value::Array(items) => items,
        Value::Object(map) => map.get(key)?.as_array()?,
        _ => return None,
    };

    Some(
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Blank-line separated blocks, trimmed, empties dropped
pub fn split_blocks(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}

/// Non-empty trimmed lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_list_from_object() {
        let value = json!({"candidates": [" Alice ", "Bob"]});
        assert_eq!(
            string_list(&value, "candidates").unwrap(),
            vec!["Alice", "Bob"]
        );
        assert!(string_list(&value, "verdicts").is_none());
    }

    #[test]
    fn test_string_list_bare_array() {
        let value = json!(["sure", 3]);
        assert_eq!(string_list(&value, "verdicts").unwrap(), vec!["sure", "3"]);
        assert!(string_list(&json!("text"), "verdicts").is_none());
    }

    #[test]
    fn test_split_blocks() {
        let text = "Name: Ada\nEmail: ada@example.com\n\n\n\nName: Grace\r\n\r\n  ";
        assert_eq!(
            split_blocks(text),
            vec!["Name: Ada\nEmail: ada@example.com", "Name: Grace"]
        );
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("1. sure\n\n 2. maybe \n"), vec!["1. sure", "2. maybe"]);
    }
}
