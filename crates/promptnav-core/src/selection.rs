#![forbid(unsafe_code)]

//! Selection reconciliation against the currently filtered prompt list.
//!
//! A selection is only meaningful relative to the filtered list. Both helpers
//! return `None` exactly when the list is empty, and otherwise always return
//! an id that is present in the list.

use crate::prompt::{Prompt, PromptId};

/// Anything that carries a prompt id.
pub trait Identified {
    fn prompt_id(&self) -> &PromptId;
}

impl Identified for Prompt {
    fn prompt_id(&self) -> &PromptId {
        &self.id
    }
}

impl Identified for PromptId {
    fn prompt_id(&self) -> &PromptId {
        self
    }
}

impl<T: Identified + ?Sized> Identified for &T {
    fn prompt_id(&self) -> &PromptId {
        (**self).prompt_id()
    }
}

fn position_of<T: Identified>(items: &[T], id: Option<&PromptId>) -> Option<usize> {
    let id = id?;
    items.iter().position(|item| item.prompt_id() == id)
}

/// Keep `current` if it is still listed, otherwise fall back to the first item.
#[must_use]
pub fn normalize_selection<T: Identified>(
    filtered: &[T],
    current: Option<&PromptId>,
) -> Option<PromptId> {
    let first = filtered.first()?;
    match position_of(filtered, current) {
        Some(index) => Some(filtered[index].prompt_id().clone()),
        None => Some(first.prompt_id().clone()),
    }
}

/// Move the selection by `delta` with cyclic wrap-around.
///
/// A missing or unlisted `current` anchors at index 0, so `+1` lands on the
/// second item and `-1` on the last.
#[must_use]
pub fn next_selection<T: Identified>(
    filtered: &[T],
    current: Option<&PromptId>,
    delta: i64,
) -> Option<PromptId> {
    if filtered.is_empty() {
        return None;
    }
    let len = filtered.len() as i64;
    let start = position_of(filtered, current).unwrap_or(0) as i64;
    let next = (start + delta.rem_euclid(len)).rem_euclid(len) as usize;
    Some(filtered[next].prompt_id().clone())
}
