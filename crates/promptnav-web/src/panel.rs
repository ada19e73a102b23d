#![forbid(unsafe_code)]

//! The panel's DOM: construction, rendering and positioning.

use promptnav_core::geometry::{Position, Size};
use promptnav_core::state::PanelView;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, HtmlInputElement, Node, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

use crate::markup::{
    COLLAPSED_ATTR, COPY_CLASS, COPY_ID_ATTR, COPY_TITLE, DRAGGING_ATTR, DockStyle, EMPTY_ID,
    HEADER_ID, INPUT_ID, ITEM_CLASS, LIST_ID, PANEL_ID, PROMPT_ID_ATTR, ROOT_ID, ROW_CLASS,
    SELECTED_ATTR, STYLE_ID, STYLESHEET, TOGGLE_ID, id_selector, panel_html,
};

fn part<T: JsCast>(root: &Element, id: &str) -> Result<T, JsValue> {
    root.query_selector(&id_selector(id))?
        .ok_or_else(|| JsValue::from_str(&format!("panel part #{id} missing")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("panel part #{id} has the wrong type")))
}

fn ensure_stylesheet(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }
    let style = document.create_element("style")?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(STYLESHEET));
    match document.head() {
        Some(head) => head.append_child(&style)?,
        None => document.document_element().ok_or("no document element")?.append_child(&style)?,
    };
    Ok(())
}

/// Handles to the installed panel's elements.
#[derive(Debug, Clone)]
pub struct PanelDom {
    document: Document,
    root: HtmlElement,
    panel: Element,
    header: HtmlElement,
    toggle: HtmlElement,
    input: HtmlInputElement,
    list: HtmlElement,
    empty: HtmlElement,
}

impl PanelDom {
    /// Whether a panel is already on the page.
    pub fn exists(document: &Document) -> bool {
        document.get_element_by_id(ROOT_ID).is_some()
    }

    /// Build the panel and append it to `<body>`.
    pub fn install(document: &Document, toggle_code: &str) -> Result<Self, JsValue> {
        ensure_stylesheet(document)?;
        let body = document.body().ok_or("document has no body")?;
        let root = document.create_element("div")?.dyn_into::<HtmlElement>()?;
        root.set_id(ROOT_ID);
        root.set_inner_html(&panel_html(toggle_code));
        body.append_child(&root)?;

        Ok(Self {
            document: document.clone(),
            panel: part(&root, PANEL_ID)?,
            header: part(&root, HEADER_ID)?,
            toggle: part(&root, TOGGLE_ID)?,
            input: part(&root, INPUT_ID)?,
            list: part(&root, LIST_ID)?,
            empty: part(&root, EMPTY_ID)?,
            root,
        })
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub fn header(&self) -> &HtmlElement {
        &self.header
    }

    pub fn toggle(&self) -> &HtmlElement {
        &self.toggle
    }

    pub fn input(&self) -> &HtmlInputElement {
        &self.input
    }

    pub fn list(&self) -> &HtmlElement {
        &self.list
    }

    /// Whether `node` is the panel or sits inside it.
    pub fn contains(&self, node: &Node) -> bool {
        self.root.contains(Some(node))
    }

    pub fn update_panel(&self, collapsed: bool, toggle_label: &str) {
        let value = if collapsed { "true" } else { "false" };
        if let Err(err) = self.panel.set_attribute(COLLAPSED_ATTR, value) {
            tracing::debug!(error = ?err, "could not mark panel collapsed state");
        }
        self.toggle.set_text_content(Some(toggle_label));
    }

    pub fn sync_input(&self, filter: &str) {
        self.input.set_value(filter);
    }

    pub fn focus_filter(&self) {
        if let Err(err) = self.input.focus() {
            tracing::debug!(error = ?err, "could not focus filter");
        }
        self.input.select();
    }

    pub fn set_dragging(&self, dragging: bool) {
        let result = if dragging {
            self.panel.set_attribute(DRAGGING_ATTR, "true")
        } else {
            self.panel.remove_attribute(DRAGGING_ATTR)
        };
        if let Err(err) = result {
            tracing::debug!(error = ?err, "could not update drag marker");
        }
    }

    /// Current top-left corner and size of the panel.
    pub fn bounds(&self) -> (Position, Size) {
        let rect = self.root.get_bounding_client_rect();
        (
            Position::new(rect.left(), rect.top()),
            Size::new(rect.width(), rect.height()),
        )
    }

    pub fn apply_dock(&self, dock: &DockStyle) {
        let style = self.root.style();
        for (prop, value) in dock.properties() {
            if let Err(err) = style.set_property(prop, value) {
                tracing::debug!(prop, error = ?err, "could not position panel");
            }
        }
    }

    /// Replace the list contents with `view`.
    pub fn render(&self, view: &PanelView) -> Result<(), JsValue> {
        self.list.set_text_content(Some(""));

        if let Some(message) = view.empty {
            self.empty.style().set_property("display", "block")?;
            self.empty.set_text_content(Some(message));
            return Ok(());
        }
        self.empty.style().set_property("display", "none")?;

        let mut selected_button = None;
        for row in &view.rows {
            let li = self.document.create_element("li")?;
            li.set_class_name(ROW_CLASS);

            let jump = self.document.create_element("button")?;
            jump.set_attribute("type", "button")?;
            jump.set_class_name(ITEM_CLASS);
            jump.set_attribute(PROMPT_ID_ATTR, row.id.as_str())?;
            jump.set_attribute(SELECTED_ATTR, if row.selected { "true" } else { "false" })?;
            jump.set_attribute("title", &row.title)?;
            jump.set_text_content(Some(&row.preview));

            let copy = self.document.create_element("button")?;
            copy.set_attribute("type", "button")?;
            copy.set_class_name(COPY_CLASS);
            copy.set_attribute(COPY_ID_ATTR, row.id.as_str())?;
            copy.set_attribute("title", COPY_TITLE)?;
            copy.set_text_content(Some(row.copy_label()));

            li.append_child(&jump)?;
            li.append_child(&copy)?;
            self.list.append_child(&li)?;
            if row.selected {
                selected_button = Some(jump);
            }
        }

        if let Some(button) = selected_button {
            let options = ScrollIntoViewOptions::new();
            options.set_block(ScrollLogicalPosition::Nearest);
            button.scroll_into_view_with_scroll_into_view_options(&options);
        }
        Ok(())
    }

    pub fn remove(&self) {
        self.root.remove();
    }
}
