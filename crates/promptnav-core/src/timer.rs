#![forbid(unsafe_code)]

//! Host timer bookkeeping.
//!
//! The host owns the actual timers (`setTimeout`/`setInterval`); these types
//! only track which timer is pending so that re-arming always cancels the
//! previous one. That gives trailing-debounce semantics for the rescan timer
//! and restart semantics for the "Copied" reset timer.

/// At most one pending host timer.
///
/// `H` is whatever the host needs to cancel the timer: an id, or an id plus
/// the callback it must keep alive. Replacing or taking the handle hands it
/// back, so the host can release the callback with it.
#[derive(Debug)]
pub struct TimerSlot<H> {
    pending: Option<H>,
}

impl<H> Default for TimerSlot<H> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<H> TimerSlot<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` as the pending timer.
    ///
    /// Returns the previously pending handle, which the caller must cancel.
    #[must_use = "the previous timer must be cancelled"]
    pub fn rearm(&mut self, handle: H) -> Option<H> {
        self.pending.replace(handle)
    }

    /// Remove the pending handle, for cancellation or because it fired.
    pub fn take(&mut self) -> Option<H> {
        self.pending.take()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Detects client-side navigation by polling the page path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathWatcher {
    last: String,
}

impl PathWatcher {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { last: path.into() }
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.last
    }

    /// Record `path`; true when it differs from the previous observation.
    pub fn observe(&mut self, path: &str) -> bool {
        if self.last == path {
            return false;
        }
        crate::debug!(from = %self.last, to = %path, "page path changed");
        self.last = path.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_returns_previous_handle_for_cancellation() {
        let mut slot = TimerSlot::new();
        assert!(!slot.is_pending());
        assert_eq!(slot.rearm(1), None);
        assert_eq!(slot.rearm(2), Some(1));
        assert_eq!(slot.rearm(3), Some(2));
        assert!(slot.is_pending());
    }

    #[test]
    fn take_clears_pending() {
        let mut slot = TimerSlot::new();
        let _ = slot.rearm("t");
        assert_eq!(slot.take(), Some("t"));
        assert_eq!(slot.take(), None);
        assert!(!slot.is_pending());
    }

    #[test]
    fn replaced_and_taken_handles_release_their_payload() {
        use std::rc::Rc;

        let first = Rc::new(());
        let second = Rc::new(());
        let mut slot = TimerSlot::new();
        let _ = slot.rearm((1, Rc::clone(&first)));
        assert_eq!(Rc::strong_count(&first), 2);

        let previous = slot.rearm((2, Rc::clone(&second)));
        assert_eq!(previous.as_ref().map(|(id, _)| *id), Some(1));
        drop(previous);
        assert_eq!(Rc::strong_count(&first), 1);

        drop(slot.take());
        assert_eq!(Rc::strong_count(&second), 1);
        assert!(!slot.is_pending());
    }

    #[test]
    fn path_watcher_reports_changes_once() {
        let mut watcher = PathWatcher::new("/c/1");
        assert!(!watcher.observe("/c/1"));
        assert!(watcher.observe("/c/2"));
        assert!(!watcher.observe("/c/2"));
        assert_eq!(watcher.current(), "/c/2");
    }
}
