#![forbid(unsafe_code)]

//! Keyboard routing for the navigator panel.
//!
//! The host captures a DOM `keydown`, reduces it to a [`KeyInput`] plus a
//! [`KeyContext`] snapshot, and asks [`Keymap::classify`] what to do. The
//! classifier is a pure decision table: no hidden state, no side effects.
//!
//! Precedence, top to bottom:
//! 1. Alt + toggle code (default `KeyP`) toggles the panel unless the event is
//!    an auto-repeat. This is the only shortcut that works while collapsed.
//! 2. Everything else is ignored while collapsed.
//! 3. A bare `/` outside an editable control focuses the filter.
//! 4. Arrow/Enter/Escape need panel context (target or active element inside
//!    the panel, or armed keyboard mode with a non-editable target) and no
//!    Ctrl/Meta/Alt.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// DOM `code` of the default toggle shortcut (Alt+P).
pub const DEFAULT_TOGGLE_CODE: &str = "KeyP";

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

impl Modifiers {
    /// Build from the four DOM `KeyboardEvent` modifier booleans.
    #[must_use]
    pub fn from_dom(shift: bool, alt: bool, ctrl: bool, meta: bool) -> Self {
        let mut mods = Self::empty();
        mods.set(Self::SHIFT, shift);
        mods.set(Self::ALT, alt);
        mods.set(Self::CTRL, ctrl);
        mods.set(Self::META, meta);
        mods
    }

    /// Ctrl, Meta or Alt: combinations reserved for the host page and OS.
    #[must_use]
    pub const fn has_command(self) -> bool {
        self.intersects(Self::ALT.union(Self::CTRL).union(Self::META))
    }
}

/// The logical keys the navigator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    Slash,
    Up,
    Down,
    Enter,
    Escape,
    Other,
}

impl NavKey {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "/" => Self::Slash,
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

/// A normalized `keydown` event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyInput {
    /// DOM `key` (logical key, layout dependent).
    pub key: Box<str>,
    /// DOM `code` (physical key, layout independent).
    pub code: Box<str>,
    pub mods: Modifiers,
    pub repeat: bool,
}

impl KeyInput {
    #[must_use]
    pub fn new(key: &str, code: &str, mods: Modifiers, repeat: bool) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            mods,
            repeat,
        }
    }

    /// Shorthand for a key pressed without modifiers.
    #[must_use]
    pub fn plain(key: &str) -> Self {
        Self::new(key, "", Modifiers::empty(), false)
    }

    #[must_use]
    pub fn nav_key(&self) -> NavKey {
        NavKey::from_dom_key(&self.key)
    }
}

/// Snapshot of the page and panel at the moment of the key event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyContext {
    /// Panel is collapsed to its header.
    pub collapsed: bool,
    /// Event target is an input, textarea, contenteditable or `role=textbox`.
    pub target_editable: bool,
    /// Event target is inside the panel.
    pub target_in_panel: bool,
    /// `document.activeElement` is inside the panel.
    pub active_in_panel: bool,
    /// Keyboard mode is armed (see [`crate::state::PanelState`]).
    pub armed: bool,
    /// The filter input currently holds text.
    pub has_filter: bool,
}

impl KeyContext {
    /// Whether arrow/enter/escape shortcuts may act on the panel.
    #[must_use]
    pub const fn panel_has_context(&self) -> bool {
        self.target_in_panel || self.active_in_panel || (self.armed && !self.target_editable)
    }
}

/// What the shell should do in response to a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyAction {
    TogglePanel,
    FocusFilter,
    MoveSelection { delta: i64 },
    TriggerSelected,
    ClearFilter,
    CollapsePanel,
}

/// Key bindings for the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    toggle_code: Box<str>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new(DEFAULT_TOGGLE_CODE)
    }
}

impl Keymap {
    /// Bind the panel toggle to Alt + the given DOM `code`.
    #[must_use]
    pub fn new(toggle_code: &str) -> Self {
        Self {
            toggle_code: toggle_code.into(),
        }
    }

    /// Classify one key event. Total and side-effect free.
    #[must_use]
    pub fn classify(&self, input: &KeyInput, ctx: &KeyContext) -> Option<KeyAction> {
        if input.mods.contains(Modifiers::ALT) && *input.code == *self.toggle_code {
            return (!input.repeat).then_some(KeyAction::TogglePanel);
        }

        if ctx.collapsed {
            return None;
        }

        let key = input.nav_key();

        if key == NavKey::Slash && !input.mods.has_command() && !ctx.target_editable {
            return Some(KeyAction::FocusFilter);
        }

        if !ctx.panel_has_context() || input.mods.has_command() {
            return None;
        }

        match key {
            NavKey::Down => Some(KeyAction::MoveSelection { delta: 1 }),
            NavKey::Up => Some(KeyAction::MoveSelection { delta: -1 }),
            NavKey::Enter => Some(KeyAction::TriggerSelected),
            NavKey::Escape if ctx.has_filter => Some(KeyAction::ClearFilter),
            NavKey::Escape => Some(KeyAction::CollapsePanel),
            NavKey::Slash | NavKey::Other => None,
        }
    }
}

/// Classify with the default keymap (Alt+P toggle).
#[must_use]
pub fn classify(input: &KeyInput, ctx: &KeyContext) -> Option<KeyAction> {
    Keymap::default().classify(input, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alt_p(repeat: bool) -> KeyInput {
        KeyInput::new("p", "KeyP", Modifiers::ALT, repeat)
    }

    #[test]
    fn alt_p_toggles_panel() {
        assert_eq!(
            classify(&alt_p(false), &KeyContext::default()),
            Some(KeyAction::TogglePanel)
        );
    }

    #[test]
    fn alt_p_repeat_is_ignored() {
        assert_eq!(classify(&alt_p(true), &KeyContext::default()), None);
    }

    #[test]
    fn alt_p_toggles_even_when_collapsed_and_editing() {
        let ctx = KeyContext {
            collapsed: true,
            target_editable: true,
            ..KeyContext::default()
        };
        assert_eq!(classify(&alt_p(false), &ctx), Some(KeyAction::TogglePanel));
    }

    #[test]
    fn toggle_matches_physical_code_not_logical_key() {
        // Alt+P on macOS produces key "π" but code "KeyP".
        let input = KeyInput::new("\u{3c0}", "KeyP", Modifiers::ALT, false);
        assert_eq!(
            classify(&input, &KeyContext::default()),
            Some(KeyAction::TogglePanel)
        );
    }

    #[test]
    fn custom_toggle_code() {
        let keymap = Keymap::new("KeyJ");
        let ctx = KeyContext::default();
        assert_eq!(keymap.classify(&alt_p(false), &ctx), None);
        let alt_j = KeyInput::new("j", "KeyJ", Modifiers::ALT, false);
        assert_eq!(keymap.classify(&alt_j, &ctx), Some(KeyAction::TogglePanel));
    }

    #[test]
    fn slash_focuses_filter_when_target_not_editable() {
        assert_eq!(
            classify(&KeyInput::plain("/"), &KeyContext::default()),
            Some(KeyAction::FocusFilter)
        );
    }

    #[test]
    fn shifted_slash_still_focuses_filter() {
        // Layouts such as German QWERTZ produce "/" with Shift+7.
        let shifted = KeyInput::new("/", "Digit7", Modifiers::SHIFT, false);
        assert_eq!(
            classify(&shifted, &KeyContext::default()),
            Some(KeyAction::FocusFilter)
        );
        for mods in [Modifiers::CTRL, Modifiers::META, Modifiers::SHIFT | Modifiers::ALT] {
            let chord = KeyInput::new("/", "Slash", mods, false);
            assert_eq!(classify(&chord, &KeyContext::default()), None, "{mods:?}");
        }
    }

    #[test]
    fn slash_is_ignored_while_typing() {
        let ctx = KeyContext {
            target_editable: true,
            ..KeyContext::default()
        };
        assert_eq!(classify(&KeyInput::plain("/"), &ctx), None);
    }

    #[test]
    fn slash_with_ctrl_is_ignored() {
        let input = KeyInput::new("/", "Slash", Modifiers::CTRL, false);
        assert_eq!(classify(&input, &KeyContext::default()), None);
    }

    #[test]
    fn arrow_down_works_when_armed_outside_panel() {
        let ctx = KeyContext {
            armed: true,
            ..KeyContext::default()
        };
        assert_eq!(
            classify(&KeyInput::plain("ArrowDown"), &ctx),
            Some(KeyAction::MoveSelection { delta: 1 })
        );
    }

    #[test]
    fn armed_mode_does_not_hijack_editable_targets() {
        let ctx = KeyContext {
            armed: true,
            target_editable: true,
            ..KeyContext::default()
        };
        assert_eq!(classify(&KeyInput::plain("ArrowDown"), &ctx), None);
    }

    #[test]
    fn arrows_ignored_when_unarmed_outside_panel() {
        assert_eq!(
            classify(&KeyInput::plain("ArrowDown"), &KeyContext::default()),
            None
        );
    }

    #[test]
    fn arrow_up_works_when_target_in_panel() {
        let ctx = KeyContext {
            target_in_panel: true,
            ..KeyContext::default()
        };
        assert_eq!(
            classify(&KeyInput::plain("ArrowUp"), &ctx),
            Some(KeyAction::MoveSelection { delta: -1 })
        );
    }

    #[test]
    fn arrows_work_inside_filter_input() {
        let ctx = KeyContext {
            target_in_panel: true,
            target_editable: true,
            ..KeyContext::default()
        };
        assert_eq!(
            classify(&KeyInput::plain("ArrowDown"), &ctx),
            Some(KeyAction::MoveSelection { delta: 1 })
        );
    }

    #[test]
    fn enter_triggers_selected_with_active_panel() {
        let ctx = KeyContext {
            active_in_panel: true,
            ..KeyContext::default()
        };
        assert_eq!(
            classify(&KeyInput::plain("Enter"), &ctx),
            Some(KeyAction::TriggerSelected)
        );
    }

    #[test]
    fn escape_clears_filter_first() {
        let ctx = KeyContext {
            armed: true,
            has_filter: true,
            ..KeyContext::default()
        };
        assert_eq!(
            classify(&KeyInput::plain("Escape"), &ctx),
            Some(KeyAction::ClearFilter)
        );
    }

    #[test]
    fn escape_collapses_when_filter_empty() {
        let ctx = KeyContext {
            armed: true,
            ..KeyContext::default()
        };
        assert_eq!(
            classify(&KeyInput::plain("Escape"), &ctx),
            Some(KeyAction::CollapsePanel)
        );
    }

    #[test]
    fn command_modifiers_void_panel_shortcuts() {
        let ctx = KeyContext {
            target_in_panel: true,
            ..KeyContext::default()
        };
        for mods in [Modifiers::CTRL, Modifiers::META, Modifiers::ALT] {
            let input = KeyInput::new("ArrowDown", "ArrowDown", mods, false);
            assert_eq!(classify(&input, &ctx), None, "mods={mods:?}");
        }
    }

    #[test]
    fn shift_does_not_void_panel_shortcuts() {
        let ctx = KeyContext {
            target_in_panel: true,
            ..KeyContext::default()
        };
        let input = KeyInput::new("Enter", "Enter", Modifiers::SHIFT, false);
        assert_eq!(classify(&input, &ctx), Some(KeyAction::TriggerSelected));
    }

    #[test]
    fn collapsed_panel_ignores_arrows_even_when_armed() {
        let ctx = KeyContext {
            collapsed: true,
            armed: true,
            target_in_panel: true,
            ..KeyContext::default()
        };
        assert_eq!(classify(&KeyInput::plain("ArrowDown"), &ctx), None);
        assert_eq!(classify(&KeyInput::plain("/"), &ctx), None);
    }

    #[test]
    fn unmatched_keys_yield_nothing() {
        let ctx = KeyContext {
            target_in_panel: true,
            ..KeyContext::default()
        };
        assert_eq!(classify(&KeyInput::plain("a"), &ctx), None);
        assert_eq!(classify(&KeyInput::plain("ArrowLeft"), &ctx), None);
    }

    #[test]
    fn action_json_uses_snake_case_tag() {
        let json = serde_json::to_string(&KeyAction::MoveSelection { delta: -1 })
            .expect("serialize");
        assert_eq!(json, r#"{"type":"move_selection","delta":-1}"#);
        let back: KeyAction = serde_json::from_str(r#"{"type":"toggle_panel"}"#)
            .expect("deserialize");
        assert_eq!(back, KeyAction::TogglePanel);
    }
}
