#![forbid(unsafe_code)]

//! Navigator tuning knobs.
//!
//! Every field has a default, so a host may pass a partial JSON object (or
//! nothing at all) and get a working configuration. Hosts decode with serde
//! and then call [`NavigatorConfig::sanitized`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::PANEL_MARGIN;
use crate::keyboard::DEFAULT_TOGGLE_CODE;
use crate::persistence::DEFAULT_STORAGE_PREFIX;
use crate::scan::DEFAULT_TURN_SELECTORS;
use crate::text::DEFAULT_PREVIEW_CHARS;

/// Configuration for the prompt navigator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Preview length in characters, ellipsis included.
    pub max_preview: usize,
    /// Quiet period after the last DOM mutation before a rescan.
    pub rescan_debounce_ms: u64,
    /// Interval of the client-side navigation check.
    pub navigation_poll_ms: u64,
    /// How long a row shows "Copied" after a successful copy.
    pub copied_reset_ms: u64,
    /// Duration of the highlight flash on a jumped-to turn.
    pub highlight_ms: u64,
    /// Gap between the dragged panel and the viewport edges, CSS pixels.
    pub panel_margin: f64,
    /// Storage key prefix; the page path is appended.
    pub storage_prefix: String,
    /// Upper bound (characters) for the bare-`article` fallback heuristic.
    pub fallback_article_max_chars: usize,
    /// DOM `code` that toggles the panel together with Alt.
    pub toggle_code: String,
    /// Turn selectors, tried in order until one matches anything.
    pub selectors: Vec<String>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_preview: DEFAULT_PREVIEW_CHARS,
            rescan_debounce_ms: 150,
            navigation_poll_ms: 1000,
            copied_reset_ms: 1200,
            highlight_ms: 1300,
            panel_margin: PANEL_MARGIN,
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            fallback_article_max_chars: 3000,
            toggle_code: DEFAULT_TOGGLE_CODE.to_string(),
            selectors: DEFAULT_TURN_SELECTORS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl NavigatorConfig {
    /// Replace values that would break an invariant with their defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.panel_margin.is_finite() || self.panel_margin < 0.0 {
            self.panel_margin = defaults.panel_margin;
        }
        if self.selectors.iter().all(|s| s.trim().is_empty()) {
            self.selectors = defaults.selectors;
        }
        if self.toggle_code.is_empty() {
            self.toggle_code = defaults.toggle_code;
        }
        self
    }

    #[must_use]
    pub fn rescan_debounce(&self) -> Duration {
        Duration::from_millis(self.rescan_debounce_ms)
    }

    #[must_use]
    pub fn navigation_poll(&self) -> Duration {
        Duration::from_millis(self.navigation_poll_ms)
    }

    #[must_use]
    pub fn copied_reset(&self) -> Duration {
        Duration::from_millis(self.copied_reset_ms)
    }

    #[must_use]
    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}
