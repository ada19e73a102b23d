#![forbid(unsafe_code)]

//! Panel state record and its transitions.
//!
//! [`PanelState`] is the one mutable record the host owns. Every transition
//! returns an [`Outcome`] describing the host work it implies (re-render,
//! persist, focus the filter, jump to a turn...), so the host never has to
//! infer what changed.

use bitflags::bitflags;

use crate::geometry::Position;
use crate::keyboard::{KeyAction, KeyContext};
use crate::persistence::PersistedUi;
use crate::prompt::{Prompt, PromptId, filter_prompts, lists_differ};
use crate::selection::{next_selection, normalize_selection};

/// Empty-state message when the page has no prompts at all.
pub const EMPTY_NO_PROMPTS: &str = "No prompts found yet.";
/// Empty-state message when the filter hides every prompt.
pub const EMPTY_NO_MATCHES: &str = "No prompts match your filter.";

bitflags! {
    /// Host work requested by a state transition.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Effects: u8 {
        /// Rebuild the prompt list DOM.
        const RENDER          = 0b0000_0001;
        /// Reflect `collapsed` on the panel and toggle button.
        const PANEL           = 0b0000_0010;
        /// Write the persisted subset to storage.
        const PERSIST         = 0b0000_0100;
        /// Focus and select the filter input.
        const FOCUS_FILTER    = 0b0000_1000;
        /// Copy `filter` back into the input element.
        const SYNC_INPUT      = 0b0001_0000;
        /// Re-apply the panel position.
        const POSITION        = 0b0010_0000;
        /// The key event was consumed.
        const PREVENT_DEFAULT = 0b0100_0000;
    }
}

/// A turn the host should scroll to and highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jump {
    pub id: PromptId,
    /// Used to re-find the turn when the indexed element went away.
    pub full_text: String,
}

/// Result of a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub effects: Effects,
    pub jump: Option<Jump>,
}

impl Outcome {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(effects: Effects) -> Self {
        Self {
            effects,
            jump: None,
        }
    }

    #[must_use]
    pub fn wants(&self, effects: Effects) -> bool {
        self.effects.contains(effects)
    }

    /// Combine two outcomes; a later jump replaces an earlier one.
    #[must_use]
    pub fn merge(mut self, other: Outcome) -> Self {
        self.effects |= other.effects;
        if other.jump.is_some() {
            self.jump = other.jump;
        }
        self
    }
}

/// One row of the rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: PromptId,
    pub preview: String,
    /// Tooltip: the untruncated prompt.
    pub title: String,
    pub selected: bool,
    pub copied: bool,
}

impl RowView {
    #[must_use]
    pub fn copy_label(&self) -> &'static str {
        if self.copied { "Copied" } else { "Copy" }
    }
}

/// Everything the host needs to paint the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub rows: Vec<RowView>,
    /// Message to show instead of rows, if any.
    pub empty: Option<&'static str>,
}

impl PanelView {
    #[must_use]
    pub fn selected_row(&self) -> Option<&RowView> {
        self.rows.iter().find(|row| row.selected)
    }
}

/// The navigator's session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    collapsed: bool,
    filter: String,
    prompts: Vec<Prompt>,
    selected: Option<PromptId>,
    armed: bool,
    position: Option<Position>,
    copied: Option<PromptId>,
}

impl PanelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    #[must_use]
    pub fn selected(&self) -> Option<&PromptId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    #[must_use]
    pub fn copied(&self) -> Option<&PromptId> {
        self.copied.as_ref()
    }

    #[must_use]
    pub fn toggle_label(&self) -> &'static str {
        if self.collapsed { "Expand" } else { "Collapse" }
    }

    /// Prompts passing the current filter.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Prompt> {
        filter_prompts(&self.prompts, &self.filter)
    }

    /// Install a freshly scanned list. Renders only when it actually changed.
    pub fn replace_prompts(&mut self, prompts: Vec<Prompt>) -> Outcome {
        let changed = lists_differ(&self.prompts, &prompts);
        self.prompts = prompts;
        if changed {
            Outcome::with(Effects::RENDER)
        } else {
            Outcome::none()
        }
    }

    /// Fill in the state-derived half of a [`KeyContext`].
    #[must_use]
    pub fn key_context(
        &self,
        target_editable: bool,
        target_in_panel: bool,
        active_in_panel: bool,
    ) -> KeyContext {
        KeyContext {
            collapsed: self.collapsed,
            target_editable,
            target_in_panel,
            active_in_panel,
            armed: self.armed,
            has_filter: !self.filter.is_empty(),
        }
    }

    /// Apply a classified keyboard action.
    pub fn apply(&mut self, action: KeyAction) -> Outcome {
        let outcome = match action {
            KeyAction::TogglePanel => {
                self.collapsed = !self.collapsed;
                Outcome::with(Effects::PANEL | Effects::PERSIST)
            }
            KeyAction::FocusFilter => {
                self.armed = true;
                Outcome::with(Effects::FOCUS_FILTER)
            }
            KeyAction::MoveSelection { delta } => {
                self.selected = next_selection(&self.filtered(), self.selected.as_ref(), delta);
                Outcome::with(Effects::RENDER)
            }
            KeyAction::TriggerSelected => Outcome {
                effects: Effects::empty(),
                jump: self.selected_jump(),
            },
            KeyAction::ClearFilter => {
                self.filter.clear();
                Outcome::with(Effects::RENDER | Effects::PERSIST | Effects::SYNC_INPUT)
            }
            KeyAction::CollapsePanel => {
                self.collapsed = true;
                Outcome::with(Effects::PANEL | Effects::PERSIST)
            }
        };
        crate::trace!(?action, effects = ?outcome.effects, "key action applied");
        outcome.merge(Outcome::with(Effects::PREVENT_DEFAULT))
    }

    fn selected_jump(&self) -> Option<Jump> {
        let id = self.selected.clone()?;
        let full_text = self
            .prompts
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.full_text.clone())
            .unwrap_or_default();
        Some(Jump { id, full_text })
    }

    /// The header toggle button was clicked.
    pub fn toggle_clicked(&mut self) -> Outcome {
        self.collapsed = !self.collapsed;
        Outcome::with(Effects::PANEL | Effects::PERSIST)
    }

    /// The filter input changed.
    pub fn set_filter(&mut self, text: &str) -> Outcome {
        self.filter = text.to_string();
        Outcome::with(Effects::RENDER | Effects::PERSIST)
    }

    /// A row's jump button was clicked.
    pub fn click_prompt(&mut self, id: &PromptId) -> Outcome {
        self.selected = Some(id.clone());
        Outcome {
            effects: Effects::RENDER,
            jump: self.selected_jump(),
        }
    }

    /// Arm keyboard mode unconditionally (panel installed, filter focused).
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// A pointer went down somewhere on the page.
    pub fn pointer_down(&mut self, inside_panel: bool) {
        self.armed = inside_panel;
    }

    /// A copy succeeded for `id`.
    pub fn mark_copied(&mut self, id: &PromptId) -> Outcome {
        self.copied = Some(id.clone());
        Outcome::with(Effects::RENDER)
    }

    /// The "Copied" indicator timed out.
    pub fn clear_copied(&mut self) -> Outcome {
        self.copied = None;
        Outcome::with(Effects::RENDER)
    }

    /// Move the panel (already clamped by the caller) during a drag.
    pub fn set_position(&mut self, position: Position) -> Outcome {
        self.position = Some(position);
        Outcome::with(Effects::POSITION)
    }

    /// A drag finished; the position is worth keeping.
    pub fn drag_finished(&mut self) -> Outcome {
        Outcome::with(Effects::PERSIST)
    }

    /// The subset written to storage.
    #[must_use]
    pub fn persisted(&self) -> PersistedUi {
        PersistedUi {
            collapsed: self.collapsed,
            filter: self.filter.clone(),
            position: self.position,
        }
    }

    /// Apply whatever storage returned for this page.
    ///
    /// With nothing stored only the position is reset, so the panel docks at
    /// its default corner while keeping the current collapsed flag and filter.
    pub fn restore(&mut self, saved: Option<PersistedUi>) -> Outcome {
        match saved {
            Some(saved) => {
                self.collapsed = saved.collapsed;
                self.filter = saved.filter;
                self.position = saved.position;
            }
            None => self.position = None,
        }
        Outcome::with(Effects::PANEL | Effects::POSITION | Effects::SYNC_INPUT | Effects::RENDER)
    }

    /// Client-side navigation: forget the previous page's filter and
    /// expand the panel before the new page's state is restored.
    pub fn reset_for_navigation(&mut self) {
        self.filter.clear();
        self.collapsed = false;
    }

    /// Build the render model, first normalizing the selection against the
    /// filtered list so it never dangles.
    pub fn view(&mut self) -> PanelView {
        let selected = normalize_selection(&self.filtered(), self.selected.as_ref());
        self.selected = selected;

        let filtered = self.filtered();
        if filtered.is_empty() {
            let empty = if self.prompts.is_empty() {
                EMPTY_NO_PROMPTS
            } else {
                EMPTY_NO_MATCHES
            };
            return PanelView {
                rows: Vec::new(),
                empty: Some(empty),
            };
        }

        let rows = filtered
            .into_iter()
            .map(|prompt| RowView {
                id: prompt.id.clone(),
                preview: prompt.preview.clone(),
                title: prompt.full_text.clone(),
                selected: self.selected.as_ref() == Some(&prompt.id),
                copied: self.copied.as_ref() == Some(&prompt.id),
            })
            .collect();
        PanelView { rows, empty: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prompts(texts: &[(&str, &str)]) -> Vec<Prompt> {
        texts
            .iter()
            .map(|(id, text)| Prompt::new(PromptId::from(*id), text, 110))
            .collect()
    }

    fn loaded() -> PanelState {
        let mut state = PanelState::new();
        let _ = state.replace_prompts(prompts(&[
            ("a", "write tests for parser"),
            ("b", "draft launch notes"),
            ("c", "parser benchmarks"),
        ]));
        state
    }

    #[test]
    fn replace_renders_only_on_change() {
        let mut state = PanelState::new();
        let list = prompts(&[("a", "alpha")]);
        assert!(state.replace_prompts(list.clone()).wants(Effects::RENDER));
        assert_eq!(state.replace_prompts(list), Outcome::none());
        assert!(
            state
                .replace_prompts(prompts(&[("a", "alpha edited")]))
                .wants(Effects::RENDER)
        );
    }

    #[test]
    fn view_normalizes_selection_to_first_row() {
        let mut state = loaded();
        let view = state.view();
        assert_eq!(state.selected(), Some(&PromptId::from("a")));
        assert_eq!(view.selected_row().map(|r| r.id.as_str()), Some("a"));
        assert_eq!(view.empty, None);
    }

    #[test]
    fn selection_follows_filter() {
        let mut state = loaded();
        let _ = state.click_prompt(&PromptId::from("b"));
        let _ = state.set_filter("parser");
        let view = state.view();
        let ids: Vec<&str> = view.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(state.selected(), Some(&PromptId::from("a")));
    }

    #[test]
    fn empty_messages() {
        let mut state = PanelState::new();
        assert_eq!(state.view().empty, Some(EMPTY_NO_PROMPTS));
        assert_eq!(state.selected(), None);

        let mut state = loaded();
        let _ = state.set_filter("zzz");
        assert_eq!(state.view().empty, Some(EMPTY_NO_MATCHES));
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn move_selection_wraps_within_filtered_list() {
        let mut state = loaded();
        let _ = state.view();
        let out = state.apply(KeyAction::MoveSelection { delta: -1 });
        assert!(out.wants(Effects::RENDER | Effects::PREVENT_DEFAULT));
        assert_eq!(state.selected(), Some(&PromptId::from("c")));
        let _ = state.apply(KeyAction::MoveSelection { delta: 1 });
        assert_eq!(state.selected(), Some(&PromptId::from("a")));
    }

    #[test]
    fn trigger_selected_jumps_with_full_text() {
        let mut state = loaded();
        let _ = state.view();
        let out = state.apply(KeyAction::TriggerSelected);
        assert_eq!(
            out.jump,
            Some(Jump {
                id: PromptId::from("a"),
                full_text: "write tests for parser".into(),
            })
        );
        assert!(out.wants(Effects::PREVENT_DEFAULT));
    }

    #[test]
    fn trigger_without_selection_only_consumes_key() {
        let mut state = PanelState::new();
        let out = state.apply(KeyAction::TriggerSelected);
        assert_eq!(out, Outcome::with(Effects::PREVENT_DEFAULT));
    }

    #[test]
    fn escape_flow_clears_then_collapses() {
        let mut state = loaded();
        let _ = state.set_filter("parser");
        let out = state.apply(KeyAction::ClearFilter);
        assert!(out.wants(Effects::SYNC_INPUT | Effects::PERSIST | Effects::RENDER));
        assert_eq!(state.filter(), "");

        let out = state.apply(KeyAction::CollapsePanel);
        assert!(out.wants(Effects::PANEL | Effects::PERSIST));
        assert!(state.collapsed());
        assert_eq!(state.toggle_label(), "Expand");
    }

    #[test]
    fn toggle_flips_collapsed() {
        let mut state = PanelState::new();
        let _ = state.apply(KeyAction::TogglePanel);
        assert!(state.collapsed());
        let _ = state.toggle_clicked();
        assert!(!state.collapsed());
        assert_eq!(state.toggle_label(), "Collapse");
    }

    #[test]
    fn arming_rules() {
        let mut state = PanelState::new();
        assert!(!state.armed());
        let _ = state.apply(KeyAction::FocusFilter);
        assert!(state.armed());
        state.pointer_down(false);
        assert!(!state.armed());
        state.pointer_down(true);
        assert!(state.armed());
        state.pointer_down(false);
        state.arm();
        assert!(state.armed());
    }

    #[test]
    fn key_context_reflects_state() {
        let mut state = PanelState::new();
        let _ = state.set_filter("x");
        state.arm();
        let ctx = state.key_context(true, false, true);
        assert_eq!(
            ctx,
            KeyContext {
                collapsed: false,
                target_editable: true,
                target_in_panel: false,
                active_in_panel: true,
                armed: true,
                has_filter: true,
            }
        );
    }

    #[test]
    fn copied_marker_shows_on_row() {
        let mut state = loaded();
        let _ = state.mark_copied(&PromptId::from("b"));
        let view = state.view();
        let labels: Vec<&str> = view.rows.iter().map(RowView::copy_label).collect();
        assert_eq!(labels, vec!["Copy", "Copied", "Copy"]);
        let _ = state.clear_copied();
        assert!(state.view().rows.iter().all(|r| !r.copied));
    }

    #[test]
    fn restore_and_persist() {
        let mut state = PanelState::new();
        let _ = state.set_filter("keep me");
        let _ = state.set_position(Position::new(10.0, 20.0));
        let _ = state.restore(None);
        assert_eq!(state.filter(), "keep me");
        assert_eq!(state.position(), None);

        let _ = state.restore(Some(PersistedUi {
            collapsed: true,
            filter: "saved".into(),
            position: Some(Position::new(1.0, 2.0)),
        }));
        assert_eq!(
            state.persisted(),
            PersistedUi {
                collapsed: true,
                filter: "saved".into(),
                position: Some(Position::new(1.0, 2.0)),
            }
        );
    }

    #[test]
    fn navigation_reset() {
        let mut state = loaded();
        let _ = state.set_filter("parser");
        let _ = state.apply(KeyAction::CollapsePanel);
        state.reset_for_navigation();
        assert_eq!(state.filter(), "");
        assert!(!state.collapsed());
    }

    #[test]
    fn outcome_merge_keeps_latest_jump() {
        let a = Outcome {
            effects: Effects::RENDER,
            jump: Some(Jump {
                id: PromptId::from("a"),
                full_text: String::new(),
            }),
        };
        let merged = a.merge(Outcome::with(Effects::PERSIST));
        assert!(merged.wants(Effects::RENDER | Effects::PERSIST));
        assert_eq!(merged.jump.map(|j| j.id), Some(PromptId::from("a")));
    }
}
