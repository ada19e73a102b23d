#![forbid(unsafe_code)]

//! Live-page adapters for the core scanning traits.

use promptnav_core::PromptId;
use promptnav_core::scan::{AUTHOR_ROLE_ATTR, TurnCandidate, TurnSource};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

use crate::markup::MARKER_ATTR;

const USER_ROLE_SELECTOR: &str = r#"[data-message-author-role="user"]"#;

/// Rendered text, as the user sees it.
fn rendered_text(el: &Element) -> String {
    match el.dyn_ref::<HtmlElement>() {
        Some(html) => html.inner_text(),
        None => el.text_content().unwrap_or_default(),
    }
}

/// One message element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomTurn(pub HtmlElement);

impl DomTurn {
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.0
    }
}

impl TurnCandidate for DomTurn {
    fn author_role(&self) -> Option<String> {
        self.0.get_attribute(AUTHOR_ROLE_ATTR)
    }

    fn is_article(&self) -> bool {
        self.0.tag_name().eq_ignore_ascii_case("article")
    }

    fn user_role_text(&self) -> Option<String> {
        if self.0.matches(USER_ROLE_SELECTOR).unwrap_or(false) {
            return Some(self.0.inner_text());
        }
        let node = self.0.query_selector(USER_ROLE_SELECTOR).ok().flatten()?;
        Some(rendered_text(&node))
    }

    fn text(&self) -> String {
        self.0.inner_text()
    }

    fn is_attached(&self) -> bool {
        self.0.is_connected()
    }

    fn marker(&self) -> Option<PromptId> {
        self.0.get_attribute(MARKER_ATTR).map(PromptId::from)
    }

    fn set_marker(&self, id: &PromptId) {
        if let Err(err) = self.0.set_attribute(MARKER_ATTR, id.as_str()) {
            tracing::debug!(error = ?err, "could not stamp turn marker");
        }
    }
}

/// The document, queried by CSS selector.
#[derive(Debug, Clone)]
pub struct DomSource {
    document: Document,
}

impl DomSource {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl TurnSource for DomSource {
    type Turn = DomTurn;

    fn select_all(&self, selector: &str) -> Vec<DomTurn> {
        let nodes = match self.document.query_selector_all(selector) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::warn!(selector, error = ?err, "invalid turn selector");
                return Vec::new();
            }
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .map(DomTurn)
            .collect()
    }
}

/// Text inputs, textareas, contenteditable regions and `role=textbox`.
pub fn is_editable(el: &HtmlElement) -> bool {
    el.is_instance_of::<HtmlInputElement>()
        || el.is_instance_of::<HtmlTextAreaElement>()
        || el.is_content_editable()
        || el.get_attribute("role").as_deref() == Some("textbox")
}
