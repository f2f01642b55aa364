//! Accumulated search context.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A candidate fragment proposed for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Position among the siblings generated for the stage
    pub index: usize,
    pub text: String,
}

/// Ordered mapping of stage name to accepted fragment.
///
/// Entries are appended in stage order while descending and removed from
/// the end while backtracking; only the engine mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    entries: Vec<(String, String)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, fragment: impl Into<String>) {
        self.entries.push((name.into(), fragment.into()));
    }

    pub(crate) fn pop(&mut self) -> Option<(String, String)> {
        self.entries.pop()
    }

    /// Fragment accepted for `name`, if that stage has been filled
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, fragment)| fragment.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, fragment)` pairs in stage order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, fragment)| (name.as_str(), fragment.as_str()))
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, fragment) in &self.entries {
            map.serialize_entry(name, fragment)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_keeps_order() {
        let mut ctx = Context::new();
        ctx.push("a", "first");
        ctx.push("b", "second");
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("b"), Some("second"));

        let popped = ctx.pop().unwrap();
        assert_eq!(popped.0, "b");
        assert_eq!(ctx.get("b"), None);
        assert_eq!(ctx.iter().collect::<Vec<_>>(), vec![("a", "first")]);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let mut ctx = Context::new();
        ctx.push("zeta", "z");
        ctx.push("alpha", "a");
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":"a"}"#);
    }
}
