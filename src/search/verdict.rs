//! Candidate verdicts.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Leading list markers like "1.", "2)", "- " or "*"
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+\s*[.):\-]|[-*•])?\s*").expect("valid regex"));

/// Qualitative judgement of one candidate against the overall goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Continue with the full remaining budget
    Sure,
    /// Continue with the budget reduced by one
    Maybe,
    /// Skip this candidate
    Impossible,
}

impl Verdict {
    pub fn is_viable(self) -> bool {
        !matches!(self, Verdict::Impossible)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Sure => "sure",
            Verdict::Maybe => "maybe",
            Verdict::Impossible => "impossible",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    /// Accepts the bare word or a numbered list line ("2. maybe"),
    /// case-insensitive, ignoring trailing punctuation and commentary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = LIST_MARKER.replace(s, "");
        let word: String = stripped
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();

        match word.as_str() {
            "sure" => Ok(Verdict::Sure),
            "maybe" => Ok(Verdict::Maybe),
            "impossible" => Ok(Verdict::Impossible),
            _ => Err(format!(
                "Unknown verdict '{}'. Valid values: sure, maybe, impossible",
                s.trim()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_words() {
        assert_eq!("sure".parse::<Verdict>().unwrap(), Verdict::Sure);
        assert_eq!("Maybe".parse::<Verdict>().unwrap(), Verdict::Maybe);
        assert_eq!(" IMPOSSIBLE ".parse::<Verdict>().unwrap(), Verdict::Impossible);
    }

    #[test]
    fn test_parse_list_lines() {
        assert_eq!("1. sure".parse::<Verdict>().unwrap(), Verdict::Sure);
        assert_eq!("2) maybe - needs dates".parse::<Verdict>().unwrap(), Verdict::Maybe);
        assert_eq!("- impossible.".parse::<Verdict>().unwrap(), Verdict::Impossible);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("likely".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
        assert!("3.".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_display_and_viability() {
        assert_eq!(Verdict::Maybe.to_string(), "maybe");
        assert!(Verdict::Sure.is_viable());
        assert!(Verdict::Maybe.is_viable());
        assert!(!Verdict::Impossible.is_viable());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Verdict::Impossible).unwrap();
        assert_eq!(json, "\"impossible\"");
        let parsed: Verdict = serde_json::from_str("\"sure\"").unwrap();
        assert_eq!(parsed, Verdict::Sure);
    }
}
