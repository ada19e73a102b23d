#![forbid(unsafe_code)]

//! The navigator: scanning, keyboard routing and panel state behind one
//! handle.
//!
//! A host owns exactly one [`Navigator`], feeds it page events and applies the
//! returned [`Outcome`]s. Nothing here touches a real DOM; the page is reached
//! through [`TurnSource`].

use crate::config::NavigatorConfig;
use crate::keyboard::{KeyInput, Keymap};
use crate::prompt::Prompt;
use crate::scan::{ScanRules, Scanner, TurnCandidate, TurnSource};
use crate::state::{Jump, Outcome, PanelState};

/// Where the event that produced a keystroke came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyTarget {
    /// The event target is a text input, textarea or contenteditable.
    pub editable: bool,
    /// The event target is inside the panel.
    pub in_panel: bool,
    /// `document.activeElement` is inside the panel.
    pub active_in_panel: bool,
}

/// Result of [`Navigator::locate`].
#[derive(Debug)]
pub struct Located<T> {
    /// The turn to scroll to, if one could be found.
    pub element: Option<T>,
    /// Work caused by the resync, if one happened.
    pub outcome: Outcome,
}

#[derive(Debug)]
pub struct Navigator<T> {
    config: NavigatorConfig,
    keymap: Keymap,
    scanner: Scanner<T>,
    state: PanelState,
}

impl<T: TurnCandidate> Navigator<T> {
    #[must_use]
    pub fn new(config: NavigatorConfig) -> Self {
        let config = config.sanitized();
        let rules = ScanRules {
            selectors: config.selectors.clone(),
            max_preview: config.max_preview,
            article_max_chars: config.fallback_article_max_chars,
        };
        Self {
            keymap: Keymap::new(&config.toggle_code),
            scanner: Scanner::new(rules),
            state: PanelState::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    /// Re-derive the prompt list and install it.
    pub fn rescan<S: TurnSource<Turn = T>>(&mut self, source: &S) -> Outcome {
        let prompts = self.scanner.rescan(source);
        self.state.replace_prompts(prompts)
    }

    /// Route one keydown. Returns an empty outcome when the key is not ours.
    pub fn handle_key(&mut self, input: &KeyInput, target: KeyTarget) -> Outcome {
        let ctx = self
            .state
            .key_context(target.editable, target.in_panel, target.active_in_panel);
        match self.keymap.classify(input, &ctx) {
            Some(action) => self.state.apply(action),
            None => Outcome::none(),
        }
    }

    /// Find the element to scroll to for `jump`.
    ///
    /// Tries the indexed element, then any prompt with the same text. When
    /// both miss, the page is rescanned once and the lookups repeated.
    pub fn locate<S: TurnSource<Turn = T>>(&mut self, source: &S, jump: &Jump) -> Located<T> {
        if let Some(element) = self.find(jump) {
            return Located {
                element: Some(element),
                outcome: Outcome::none(),
            };
        }

        crate::debug!(id = %jump.id, "jump target detached; resyncing");
        let outcome = self.rescan(source);
        let element = self.find(jump);
        if element.is_none() {
            crate::debug!(id = %jump.id, "jump target not found after resync");
        }
        Located { element, outcome }
    }

    fn find(&self, jump: &Jump) -> Option<T> {
        if let Some(element) = self.scanner.attached(&jump.id) {
            return Some(element.clone());
        }
        let twin: &Prompt = self
            .state
            .prompts()
            .iter()
            .find(|p| p.full_text == jump.full_text)?;
        self.scanner.attached(&twin.id).cloned()
    }
}

impl<T: TurnCandidate> Default for Navigator<T> {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}
