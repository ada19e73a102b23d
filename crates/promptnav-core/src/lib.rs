#![forbid(unsafe_code)]

//! Core: prompt scanning, filtering, selection, keyboard routing and panel
//! state for the prompt navigator overlay.
//!
//! Everything here is host-agnostic. The browser shell lives in
//! `promptnav-web` and reaches the page through the traits in [`scan`],
//! [`persistence`] and [`clipboard`].

pub mod clipboard;
pub mod config;
pub mod geometry;
pub mod keyboard;
pub mod logging;
pub mod navigator;
pub mod persistence;
pub mod prompt;
pub mod scan;
pub mod selection;
pub mod state;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod text;
pub mod timer;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};

pub use config::NavigatorConfig;
pub use keyboard::{KeyAction, KeyContext, KeyInput, Keymap, Modifiers, classify};
pub use navigator::{KeyTarget, Located, Navigator};
pub use prompt::{Prompt, PromptId, filter_prompts, lists_differ};
pub use selection::{next_selection, normalize_selection};
pub use state::{Effects, Jump, Outcome, PanelState, PanelView, RowView};
pub use text::{normalize, truncate};
