#![forbid(unsafe_code)]

//! In-memory page used by tests and headless hosts.
//!
//! [`FakeDom`] answers selectors by exact string match against the selector
//! each turn was registered under; it does not parse CSS.

use std::cell::RefCell;
use std::rc::Rc;

use crate::prompt::PromptId;
use crate::scan::{TurnCandidate, TurnSource};

#[derive(Debug, Default)]
struct TurnData {
    role: Option<String>,
    article: bool,
    user_text: Option<String>,
    text: String,
    detached: bool,
    marker: Option<PromptId>,
}

/// A scripted turn element. Clones share state, like DOM node handles.
#[derive(Debug, Clone, Default)]
pub struct FakeTurn(Rc<RefCell<TurnData>>);

impl FakeTurn {
    fn from_data(data: TurnData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    /// An element carrying `role="user"`.
    #[must_use]
    pub fn user(text: &str) -> Self {
        Self::from_data(TurnData {
            role: Some("user".into()),
            user_text: Some(text.into()),
            text: text.into(),
            ..TurnData::default()
        })
    }

    /// An element with an arbitrary role attribute and no user-role node.
    #[must_use]
    pub fn with_role(role: &str, text: &str) -> Self {
        Self::from_data(TurnData {
            role: Some(role.into()),
            text: text.into(),
            ..TurnData::default()
        })
    }

    /// A wrapper without a role whose descendant carries `role="user"`.
    #[must_use]
    pub fn container_of_user(inner: &str) -> Self {
        Self::from_data(TurnData {
            user_text: Some(inner.into()),
            text: format!("You said: {inner}"),
            ..TurnData::default()
        })
    }

    /// A bare `<article>` without role attributes.
    #[must_use]
    pub fn article(text: &str) -> Self {
        Self::from_data(TurnData {
            article: true,
            text: text.into(),
            ..TurnData::default()
        })
    }

    /// A bare non-article element.
    #[must_use]
    pub fn plain(text: &str) -> Self {
        Self::from_data(TurnData {
            text: text.into(),
            ..TurnData::default()
        })
    }

    #[must_use]
    pub fn as_article(self, article: bool) -> Self {
        self.0.borrow_mut().article = article;
        self
    }

    /// Replace the element's text, as a streaming edit would.
    pub fn set_text(&self, text: &str) {
        let mut data = self.0.borrow_mut();
        if data.user_text.is_some() {
            data.user_text = Some(text.into());
        }
        data.text = text.into();
    }

    /// Remove the element from the document.
    pub fn detach(&self) {
        self.0.borrow_mut().detached = true;
    }
}

impl TurnCandidate for FakeTurn {
    fn author_role(&self) -> Option<String> {
        self.0.borrow().role.clone()
    }

    fn is_article(&self) -> bool {
        self.0.borrow().article
    }

    fn user_role_text(&self) -> Option<String> {
        self.0.borrow().user_text.clone()
    }

    fn text(&self) -> String {
        self.0.borrow().text.clone()
    }

    fn is_attached(&self) -> bool {
        !self.0.borrow().detached
    }

    fn marker(&self) -> Option<PromptId> {
        self.0.borrow().marker.clone()
    }

    fn set_marker(&self, id: &PromptId) {
        self.0.borrow_mut().marker = Some(id.clone());
    }
}

/// A page made of [`FakeTurn`]s registered per selector.
#[derive(Debug, Default)]
pub struct FakeDom {
    turns: RefCell<Vec<(String, FakeTurn)>>,
}

impl FakeDom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `turn` as a match for `selector`.
    pub fn add(&self, selector: &str, turn: FakeTurn) {
        self.turns.borrow_mut().push((selector.to_string(), turn));
    }

    /// Detach and drop every registered turn.
    pub fn clear(&self) {
        for (_, turn) in self.turns.borrow_mut().drain(..) {
            turn.detach();
        }
    }

    /// Detach and drop the turns for which `remove` returns true.
    pub fn remove_where(&self, mut remove: impl FnMut(&FakeTurn) -> bool) {
        self.turns.borrow_mut().retain(|(_, turn)| {
            if remove(turn) {
                turn.detach();
                false
            } else {
                true
            }
        });
    }
}

impl TurnSource for FakeDom {
    type Turn = FakeTurn;

    fn select_all(&self, selector: &str) -> Vec<FakeTurn> {
        self.turns
            .borrow()
            .iter()
            .filter(|(sel, turn)| sel == selector && turn.is_attached())
            .map(|(_, turn)| turn.clone())
            .collect()
    }
}
