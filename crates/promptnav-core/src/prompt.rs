#![forbid(unsafe_code)]

//! Prompt records, substring filtering and list change detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::text::{normalize, truncate};

/// Identifier of one observed turn element (`turn-<n>`).
///
/// Stable for as long as the element stays on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(Box<str>);

impl PromptId {
    /// Build the id for the `n`th element ever observed.
    #[must_use]
    pub fn for_turn(n: u64) -> Self {
        Self(format!("turn-{n}").into_boxed_str())
    }

    /// The `n` of an id built by [`PromptId::for_turn`].
    #[must_use]
    pub fn turn_index(&self) -> Option<u64> {
        self.0.strip_prefix("turn-")?.parse().ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PromptId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for PromptId {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for PromptId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for PromptId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A displayable record derived from one user turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    /// Whitespace-normalized message text.
    pub full_text: String,
    /// `full_text` truncated to the preview budget.
    pub preview: String,
}

impl Prompt {
    /// Build a prompt from raw turn text, normalizing and truncating it.
    #[must_use]
    pub fn new(id: PromptId, raw_text: &str, max_preview: usize) -> Self {
        let full_text = normalize(raw_text);
        let preview = truncate(&full_text, Some(max_preview));
        Self {
            id,
            full_text,
            preview,
        }
    }
}

/// Return the prompts whose text contains `query`, ignoring case.
///
/// A query that is empty after trimming selects every prompt. Order is
/// preserved and the returned references point into `prompts`.
#[must_use]
pub fn filter_prompts<'a>(prompts: &'a [Prompt], query: &str) -> Vec<&'a Prompt> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return prompts.iter().collect();
    }
    prompts
        .iter()
        .filter(|prompt| prompt.full_text.to_lowercase().contains(&needle))
        .collect()
}

/// True when `next` would render differently from `prev`.
///
/// Compares lengths, then every positional pair by id, full text and preview.
#[must_use]
pub fn lists_differ(prev: &[Prompt], next: &[Prompt]) -> bool {
    prev.len() != next.len()
        || prev.iter().zip(next).any(|(a, b)| {
            a.id != b.id || a.full_text != b.full_text || a.preview != b.preview
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prompt(id: &str, text: &str) -> Prompt {
        Prompt {
            id: id.into(),
            full_text: text.to_string(),
            preview: text.to_string(),
        }
    }

    #[test]
    fn new_normalizes_and_truncates() {
        let p = Prompt::new(PromptId::for_turn(3), "  hello\n  there  friend ", 8);
        assert_eq!(p.id, "turn-3");
        assert_eq!(p.id.turn_index(), Some(3));
        assert_eq!(PromptId::from("turn-x").turn_index(), None);
        assert_eq!(PromptId::from("user-3").turn_index(), None);
        assert_eq!(p.full_text, "hello there friend");
        assert_eq!(p.preview, "hello t\u{2026}");
    }

    #[test]
    fn blank_query_returns_everything() {
        let prompts = vec![prompt("a", "Alpha"), prompt("b", "Beta")];
        let filtered: Vec<Prompt> = filter_prompts(&prompts, "   ").into_iter().cloned().collect();
        assert_eq!(filtered, prompts);
    }

    #[test]
    fn query_matches_case_insensitively() {
        let prompts = vec![
            prompt("a", "write tests for parser"),
            prompt("b", "draft launch notes"),
        ];
        let filtered = filter_prompts(&prompts, "TESTS");
        assert_eq!(filtered, vec![&prompts[0]]);
    }

    #[test]
    fn query_is_trimmed_before_matching() {
        let prompts = vec![prompt("a", "launch"), prompt("b", "lunch")];
        let ids: Vec<&str> = filter_prompts(&prompts, "  un ")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn filtering_preserves_order() {
        let prompts = vec![
            prompt("a", "fix parser"),
            prompt("b", "other"),
            prompt("c", "parser docs"),
        ];
        let ids: Vec<&str> = filter_prompts(&prompts, "parser")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn identical_lists_do_not_differ() {
        let prev = vec![prompt("a", "alpha"), prompt("b", "beta")];
        let next = vec![prompt("a", "alpha"), prompt("b", "beta")];
        assert!(!lists_differ(&prev, &next));
        assert!(!lists_differ(&[], &[]));
    }

    #[test]
    fn length_change_differs() {
        let prev = vec![prompt("a", "alpha")];
        let next = vec![prompt("a", "alpha"), prompt("b", "beta")];
        assert!(lists_differ(&prev, &next));
    }

    #[test]
    fn order_change_differs() {
        let prev = vec![prompt("a", "alpha"), prompt("b", "beta")];
        let next = vec![prompt("b", "beta"), prompt("a", "alpha")];
        assert!(lists_differ(&prev, &next));
    }

    #[test]
    fn text_change_differs() {
        let prev = vec![prompt("a", "alpha")];
        let next = vec![prompt("a", "alpha updated")];
        assert!(lists_differ(&prev, &next));
    }

    #[test]
    fn preview_only_change_differs() {
        let prev = vec![prompt("a", "alpha")];
        let mut next = prev.clone();
        next[0].preview = "alp\u{2026}".to_string();
        assert!(lists_differ(&prev, &next));
    }
}
