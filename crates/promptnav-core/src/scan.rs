#![forbid(unsafe_code)]

//! Turn discovery over an abstract page.
//!
//! The page is reached only through [`TurnSource`] and [`TurnCandidate`], so
//! the same scanning rules drive the live DOM adapter and the fakes used in
//! tests.
//!
//! The `article` fallback in [`is_likely_user_turn`] is a best-effort guess
//! for pages without role attributes. It carries no correctness guarantee
//! against host markup changes.

use std::collections::{HashMap, HashSet};

use crate::prompt::{Prompt, PromptId};
use crate::text::normalize;

/// Attribute naming the author of a message turn.
pub const AUTHOR_ROLE_ATTR: &str = "data-message-author-role";

/// Selectors tried in order; the first one that matches anything wins.
pub const DEFAULT_TURN_SELECTORS: [&str; 6] = [
    r#"[data-message-author-role="user"]"#,
    r#"article[data-testid*="conversation-turn"] [data-message-author-role="user"]"#,
    r#"article[data-testid*="conversation-turn"][data-message-author-role="user"]"#,
    r#"article[data-testid*="conversation-turn"]"#,
    r#"[data-testid*="conversation-turn"]"#,
    "main article",
];

/// One element that might be a user turn.
pub trait TurnCandidate: Clone {
    /// Value of the author-role attribute, if present.
    fn author_role(&self) -> Option<String>;

    /// Whether the element is an `<article>`.
    fn is_article(&self) -> bool;

    /// Rendered text of the user-role node: the element itself when it
    /// carries `role="user"`, otherwise its first such descendant.
    fn user_role_text(&self) -> Option<String>;

    /// Rendered text of the whole element.
    fn text(&self) -> String;

    /// Whether the element is still part of the document.
    fn is_attached(&self) -> bool;

    /// Id previously stamped onto the element by [`TurnCandidate::set_marker`].
    fn marker(&self) -> Option<PromptId>;

    fn set_marker(&self, id: &PromptId);
}

/// The page being scanned.
pub trait TurnSource {
    type Turn: TurnCandidate;

    /// All elements matching a CSS selector, in document order.
    fn select_all(&self, selector: &str) -> Vec<Self::Turn>;
}

/// Elements matched by the first selector that yields anything.
pub fn collect_candidates<S: TurnSource>(source: &S, selectors: &[String]) -> Vec<S::Turn> {
    for selector in selectors {
        let found = source.select_all(selector);
        if !found.is_empty() {
            crate::trace!(selector = %selector, count = found.len(), "turn selector matched");
            return found;
        }
    }
    Vec::new()
}

/// Heuristic user-turn test.
///
/// Explicit roles decide first: `user` or any role other than `assistant`
/// qualifies. Then a user-role descendant qualifies. Finally a non-empty
/// `article` shorter than `article_max_chars` characters qualifies.
pub fn is_likely_user_turn<T: TurnCandidate>(turn: &T, article_max_chars: usize) -> bool {
    if let Some(role) = turn.author_role().filter(|r| !r.is_empty()) {
        return role != "assistant";
    }
    if turn.user_role_text().is_some() {
        return true;
    }
    let text = turn.text();
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    turn.is_article() && text.chars().count() < article_max_chars
}

/// Raw text to index for a qualifying turn.
pub fn prompt_text<T: TurnCandidate>(turn: &T) -> String {
    turn.user_role_text().unwrap_or_else(|| turn.text())
}

/// Scanning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRules {
    pub selectors: Vec<String>,
    pub max_preview: usize,
    pub article_max_chars: usize,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_TURN_SELECTORS.iter().map(|s| (*s).to_string()).collect(),
            max_preview: crate::text::DEFAULT_PREVIEW_CHARS,
            article_max_chars: 3000,
        }
    }
}

/// Builds prompt lists and remembers which element each prompt came from.
#[derive(Debug)]
pub struct Scanner<T> {
    rules: ScanRules,
    elements: HashMap<PromptId, T>,
    next_turn: u64,
}

impl<T: TurnCandidate> Scanner<T> {
    #[must_use]
    pub fn new(rules: ScanRules) -> Self {
        Self {
            rules,
            elements: HashMap::new(),
            next_turn: 0,
        }
    }

    /// Re-derive the prompt list from the page.
    ///
    /// The element index is swapped in only after the whole pass completes.
    /// Elements keep the id stamped on them by earlier passes, including
    /// passes of a previous scanner on the same page. Fresh ids start past the
    /// highest stamped one. An id seen twice in one pass (a cloned node) is
    /// reissued for the later element.
    pub fn rescan<S: TurnSource<Turn = T>>(&mut self, source: &S) -> Vec<Prompt> {
        let candidates = collect_candidates(source, &self.rules.selectors);
        let stamped: HashSet<PromptId> = candidates
            .iter()
            .filter_map(TurnCandidate::marker)
            .collect();
        if let Some(highest) = stamped.iter().filter_map(PromptId::turn_index).max() {
            self.next_turn = self.next_turn.max(highest.saturating_add(1));
        }
        let mut prompts = Vec::with_capacity(candidates.len());
        let mut elements = HashMap::with_capacity(candidates.len());
        let mut used = HashSet::with_capacity(candidates.len());

        for turn in candidates {
            if !is_likely_user_turn(&turn, self.rules.article_max_chars) {
                continue;
            }
            let full_text = normalize(&prompt_text(&turn));
            if full_text.is_empty() {
                continue;
            }

            let id = match turn.marker() {
                Some(id) if !used.contains(&id) => id,
                _ => {
                    let id = self.fresh_id(&stamped);
                    turn.set_marker(&id);
                    id
                }
            };
            used.insert(id.clone());

            prompts.push(Prompt::new(id.clone(), &full_text, self.rules.max_preview));
            elements.insert(id, turn);
        }

        crate::debug!(prompts = prompts.len(), "rescan complete");
        self.elements = elements;
        prompts
    }

    fn fresh_id(&mut self, taken: &HashSet<PromptId>) -> PromptId {
        loop {
            let id = PromptId::for_turn(self.next_turn);
            self.next_turn += 1;
            if !taken.contains(&id) {
                return id;
            }
        }
    }

    /// The element behind `id`, if it is still attached.
    #[must_use]
    pub fn attached(&self, id: &PromptId) -> Option<&T> {
        self.elements.get(id).filter(|el| el.is_attached())
    }

    #[must_use]
    pub fn indexed(&self) -> usize {
        self.elements.len()
    }
}
