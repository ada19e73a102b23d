#![forbid(unsafe_code)]

//! Panel markup, element ids and inline styles.
//!
//! Kept free of DOM types so the strings the shell writes can be checked on
//! native targets.

use promptnav_core::geometry::Position;

pub const ROOT_ID: &str = "prompt-nav-root";
pub const PANEL_ID: &str = "prompt-nav-panel";
pub const HEADER_ID: &str = "prompt-nav-header";
pub const TOGGLE_ID: &str = "prompt-nav-toggle";
pub const INPUT_ID: &str = "prompt-nav-input";
pub const EMPTY_ID: &str = "prompt-nav-empty";
pub const LIST_ID: &str = "prompt-nav-list";
pub const STYLE_ID: &str = "prompt-nav-style";

pub const ROW_CLASS: &str = "prompt-nav-row";
pub const ITEM_CLASS: &str = "prompt-nav-item";
pub const COPY_CLASS: &str = "prompt-nav-copy";
/// Added to a turn for the duration of the jump flash.
pub const HIGHLIGHT_CLASS: &str = "prompt-nav-highlight";

pub const PROMPT_ID_ATTR: &str = "data-prompt-id";
pub const COPY_ID_ATTR: &str = "data-copy-id";
pub const SELECTED_ATTR: &str = "data-selected";
pub const COLLAPSED_ATTR: &str = "data-collapsed";
pub const DRAGGING_ATTR: &str = "data-dragging";
/// Stamped onto scanned turns so ids survive rescans.
pub const MARKER_ATTR: &str = "data-promptnav-id";

pub const COPY_TITLE: &str = "Copy full prompt";

/// Distance from the right edge when the panel has no saved position.
pub const DOCK_RIGHT: &str = "16px";

/// `#id` selector for an element id.
#[must_use]
pub fn id_selector(id: &str) -> String {
    format!("#{id}")
}

/// `.class` selector for a class name.
#[must_use]
pub fn class_selector(class: &str) -> String {
    format!(".{class}")
}

/// Inner HTML of the panel root.
#[must_use]
pub fn panel_html(toggle_code: &str) -> String {
    let shortcut = toggle_code.strip_prefix("Key").unwrap_or(toggle_code);
    format!(
        r#"<section id="{PANEL_ID}" {COLLAPSED_ATTR}="false" aria-label="Prompt navigator panel">
  <header id="{HEADER_ID}">
    <span id="prompt-nav-title">Prompt Navigator</span>
    <button id="{TOGGLE_ID}" type="button" title="Toggle panel (Alt+{shortcut})">Collapse</button>
  </header>
  <div id="prompt-nav-body">
    <input id="{INPUT_ID}" type="text" placeholder="Filter prompts..." aria-label="Filter prompts" />
    <div id="{EMPTY_ID}">No prompts found yet.</div>
    <ul id="{LIST_ID}" aria-label="Prompt list"></ul>
  </div>
</section>"#
    )
}

/// Stylesheet injected once per document.
pub const STYLESHEET: &str = r#"
#prompt-nav-root { position: fixed; top: 72px; right: 16px; z-index: 2147483000; width: 320px; font: 13px/1.4 system-ui, sans-serif; }
#prompt-nav-panel { display: flex; flex-direction: column; max-height: 70vh; background: #1f1f23; color: #ececf1; border: 1px solid #3a3a42; border-radius: 10px; box-shadow: 0 8px 24px rgba(0, 0, 0, 0.35); }
#prompt-nav-header { display: flex; align-items: center; justify-content: space-between; padding: 8px 10px; cursor: grab; user-select: none; }
#prompt-nav-panel[data-dragging="true"] #prompt-nav-header { cursor: grabbing; }
#prompt-nav-panel[data-collapsed="true"] #prompt-nav-body { display: none; }
#prompt-nav-body { display: flex; flex-direction: column; gap: 6px; padding: 0 10px 10px; min-height: 0; }
#prompt-nav-input { padding: 6px 8px; border-radius: 6px; border: 1px solid #3a3a42; background: #2a2a30; color: inherit; }
#prompt-nav-empty { opacity: 0.7; padding: 4px 0; }
#prompt-nav-list { list-style: none; margin: 0; padding: 0; overflow-y: auto; }
.prompt-nav-row { display: flex; gap: 4px; align-items: stretch; }
.prompt-nav-item { flex: 1; text-align: left; padding: 6px 8px; border: 0; border-radius: 6px; background: transparent; color: inherit; cursor: pointer; }
.prompt-nav-item:hover, .prompt-nav-item[data-selected="true"] { background: #34343c; }
.prompt-nav-copy { border: 0; border-radius: 6px; background: transparent; color: inherit; opacity: 0.7; cursor: pointer; }
@keyframes prompt-nav-flash { from { outline-color: #f5c542; } to { outline-color: transparent; } }
.prompt-nav-highlight { outline: 3px solid transparent; outline-offset: 4px; animation: prompt-nav-flash 1.3s ease-out; }
"#;

/// Inline `left/top/right/bottom` for the panel root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockStyle {
    pub left: String,
    pub top: String,
    pub right: String,
    pub bottom: String,
}

impl DockStyle {
    /// Docked at the default corner, or pinned at a dragged position.
    #[must_use]
    pub fn for_position(position: Option<Position>) -> Self {
        match position {
            None => Self {
                left: String::new(),
                top: String::new(),
                right: DOCK_RIGHT.to_string(),
                bottom: String::new(),
            },
            Some(pos) => Self {
                left: px(pos.x),
                top: px(pos.y),
                right: "auto".to_string(),
                bottom: "auto".to_string(),
            },
        }
    }

    /// Property/value pairs in application order.
    #[must_use]
    pub fn properties(&self) -> [(&'static str, &str); 4] {
        [
            ("left", &self.left),
            ("top", &self.top),
            ("right", &self.right),
            ("bottom", &self.bottom),
        ]
    }
}

/// CSS pixel length.
#[must_use]
pub fn px(value: f64) -> String {
    format!("{value}px")
}
