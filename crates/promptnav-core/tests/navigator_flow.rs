//! End-to-end flows through the navigator with a fake page, in-memory
//! storage and a scripted clipboard.

use std::cell::RefCell;

use pretty_assertions::assert_eq;
use promptnav_core::clipboard::{ClipboardError, ClipboardPrimitives, copy_text};
use promptnav_core::geometry::Position;
use promptnav_core::persistence::{MemoryStorage, PersistedUi, UiStore};
use promptnav_core::scan::{DEFAULT_TURN_SELECTORS, TurnCandidate};
use promptnav_core::state::{EMPTY_NO_MATCHES, EMPTY_NO_PROMPTS};
use promptnav_core::testing::{FakeDom, FakeTurn};
use promptnav_core::timer::PathWatcher;
use promptnav_core::{Effects, KeyInput, KeyTarget, Navigator, NavigatorConfig, PromptId};
use serde_json::json;

const USER: &str = DEFAULT_TURN_SELECTORS[0];

#[derive(Default)]
struct RecordingClipboard {
    async_ok: bool,
    copied: RefCell<Vec<String>>,
}

impl ClipboardPrimitives for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.async_ok {
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        } else {
            Err(ClipboardError::NotAvailable)
        }
    }

    fn exec_copy(&self, text: &str) -> Result<bool, ClipboardError> {
        self.copied.borrow_mut().push(format!("exec:{text}"));
        Ok(true)
    }
}

fn chat() -> FakeDom {
    let dom = FakeDom::new();
    dom.add(USER, FakeTurn::user("  write   tests\nfor parser "));
    dom.add(USER, FakeTurn::user("draft the release notes"));
    dom.add(USER, FakeTurn::user("explain parser TESTS failures"));
    dom
}

#[test]
fn scan_filter_select_copy() {
    let dom = chat();
    let mut nav = Navigator::new(NavigatorConfig::default());
    let _ = nav.rescan(&dom);

    let _ = nav.state_mut().set_filter("tests");
    let view = nav.state_mut().view();
    let previews: Vec<&str> = view.rows.iter().map(|r| r.preview.as_str()).collect();
    assert_eq!(
        previews,
        vec!["write tests for parser", "explain parser TESTS failures"]
    );

    nav.state_mut().arm();
    let out = nav.handle_key(&KeyInput::plain("ArrowDown"), KeyTarget::default());
    assert!(out.wants(Effects::RENDER | Effects::PREVENT_DEFAULT));
    let selected = nav.state().selected().cloned().expect("selection");
    assert_eq!(selected, PromptId::for_turn(2));

    let text = nav
        .state()
        .prompts()
        .iter()
        .find(|p| p.id == selected)
        .map(|p| p.full_text.clone())
        .expect("selected prompt is listed");

    let clipboard = RecordingClipboard::default();
    assert!(pollster::block_on(copy_text(&text, &clipboard)));
    assert_eq!(
        clipboard.copied.borrow().as_slice(),
        ["exec:explain parser TESTS failures".to_string()]
    );

    let _ = nav.state_mut().mark_copied(&selected);
    let view = nav.state_mut().view();
    assert_eq!(view.selected_row().map(|r| r.copy_label()), Some("Copied"));
}

#[test]
fn enter_jumps_to_selected_turn() {
    let dom = chat();
    let mut nav = Navigator::default();
    let _ = nav.rescan(&dom);
    let _ = nav.state_mut().view();

    let target = KeyTarget {
        in_panel: true,
        ..KeyTarget::default()
    };
    let out = nav.handle_key(&KeyInput::plain("Enter"), target);
    let jump = out.jump.expect("enter jumps");
    let located = nav.locate(&dom, &jump);
    assert_eq!(
        located.element.map(|t| t.text()),
        Some("  write   tests\nfor parser ".to_string())
    );
}

#[test]
fn reinstalled_navigator_keeps_ids_distinct() {
    let dom = chat();
    let before: Vec<PromptId> = {
        let mut first: Navigator<FakeTurn> = Navigator::new(NavigatorConfig::default());
        let _ = first.rescan(&dom);
        first.state().prompts().iter().map(|p| p.id.clone()).collect()
    };

    dom.add(USER, FakeTurn::user("asked after reinstall"));
    let mut nav = Navigator::new(NavigatorConfig::default());
    let _ = nav.rescan(&dom);
    let ids: Vec<&str> = nav.state().prompts().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["turn-0", "turn-1", "turn-2", "turn-3"]);
    let kept: Vec<PromptId> = nav.state().prompts()[..3].iter().map(|p| p.id.clone()).collect();
    assert_eq!(kept, before);

    let newest = PromptId::for_turn(3);
    let out = nav.state_mut().click_prompt(&newest);
    let jump = out.jump.expect("click jumps");
    let located = nav.locate(&dom, &jump);
    assert_eq!(
        located.element.map(|t| t.text()),
        Some("asked after reinstall".to_string())
    );
    let view = nav.state_mut().view();
    assert_eq!(view.rows.iter().filter(|r| r.selected).count(), 1);
}

#[test]
fn escape_clears_then_collapses() {
    let dom = chat();
    let mut nav = Navigator::default();
    let _ = nav.rescan(&dom);
    let _ = nav.state_mut().set_filter("zzz");
    assert_eq!(nav.state_mut().view().empty, Some(EMPTY_NO_MATCHES));

    let target = KeyTarget {
        active_in_panel: true,
        ..KeyTarget::default()
    };
    let out = nav.handle_key(&KeyInput::plain("Escape"), target);
    assert!(out.wants(Effects::SYNC_INPUT));
    assert_eq!(nav.state().filter(), "");

    let out = nav.handle_key(&KeyInput::plain("Escape"), target);
    assert!(out.wants(Effects::PANEL));
    assert!(nav.state().collapsed());

    // Collapsed: nothing but the toggle gets through.
    let out = nav.handle_key(&KeyInput::plain("ArrowDown"), target);
    assert!(out.effects.is_empty());
}

#[test]
fn persisted_state_round_trips_per_path() {
    let store = UiStore::new(MemoryStorage::new(), "prompt-nav:");
    let mut nav: Navigator<FakeTurn> = Navigator::default();
    let _ = nav.state_mut().set_filter("parser");
    let _ = nav.state_mut().toggle_clicked();
    let _ = nav.state_mut().set_position(Position::new(40.0, 60.0));

    pollster::block_on(store.save("/c/abc", &nav.state().persisted()));
    assert_eq!(
        store.backend().snapshot("prompt-nav:/c/abc"),
        Some(json!({"collapsed": true, "filter": "parser", "position": {"x": 40.0, "y": 60.0}}))
    );

    let mut fresh: Navigator<FakeTurn> = Navigator::default();
    let saved = pollster::block_on(store.load("/c/abc"));
    let _ = fresh.state_mut().restore(saved);
    assert_eq!(
        fresh.state().persisted(),
        PersistedUi {
            collapsed: true,
            filter: "parser".into(),
            position: Some(Position::new(40.0, 60.0)),
        }
    );

    let other = pollster::block_on(store.load("/c/other"));
    assert_eq!(other, None);
}

#[test]
fn client_side_navigation_resets_then_restores() {
    let dom = chat();
    let store = UiStore::new(MemoryStorage::new(), "prompt-nav:");
    let mut nav = Navigator::default();
    let mut watcher = PathWatcher::new("/c/one");
    let _ = nav.rescan(&dom);
    let _ = nav.state_mut().set_filter("notes");
    pollster::block_on(store.save(watcher.current(), &nav.state().persisted()));

    assert!(!watcher.observe("/c/one"));
    assert!(watcher.observe("/c/two"));

    nav.state_mut().reset_for_navigation();
    let saved = pollster::block_on(store.load(watcher.current()));
    let _ = nav.state_mut().restore(saved);
    assert_eq!(nav.state().filter(), "");

    dom.clear();
    let out = nav.rescan(&dom);
    assert!(out.wants(Effects::RENDER));
    assert_eq!(nav.state_mut().view().empty, Some(EMPTY_NO_PROMPTS));
}
