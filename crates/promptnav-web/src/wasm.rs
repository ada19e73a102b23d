#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use js_sys::{Array, Function, JSON, Promise};
use promptnav_core::clipboard::copy_text;
use promptnav_core::geometry::{DragAnchor, Position, Size, clamp_position};
use promptnav_core::persistence::{StorageBackend, UiStore};
use promptnav_core::timer::{PathWatcher, TimerSlot};
use promptnav_core::{Effects, Jump, KeyInput, KeyTarget, Modifiers, Navigator, Outcome, PromptId};
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, KeyboardEvent, MutationObserver,
    MutationObserverInit, MutationRecord, PointerEvent, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, Window,
};

use crate::console::{ConsoleLayer, ConsoleSink};
use crate::dom::{DomSource, DomTurn, is_editable};
use crate::host::{HostStorage, WebClipboard};
use crate::markup::{
    COPY_CLASS, COPY_ID_ATTR, DockStyle, HIGHLIGHT_CLASS, ITEM_CLASS, PROMPT_ID_ATTR, TOGGLE_ID,
    class_selector, id_selector,
};
use crate::options::StartOptions;
use crate::panel::PanelDom;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

struct BrowserConsole;

impl ConsoleSink for BrowserConsole {
    fn write_line(&self, level: Level, line: &str) {
        let line = JsValue::from_str(line);
        match level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

fn install_logging(max_level: LevelFilter) {
    let subscriber = tracing_subscriber::registry()
        .with(ConsoleLayer::new(BrowserConsole).with_filter(max_level));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("console logging already installed");
    }
}

// ---------------------------------------------------------------------------
// Event listeners
// ---------------------------------------------------------------------------

type Handler = Closure<dyn FnMut(Event)>;

/// Registered listeners, kept alive until [`Listeners::remove_all`].
#[derive(Default)]
struct Listeners(Vec<(EventTarget, &'static str, Handler)>);

impl Listeners {
    fn add(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        let handler = Handler::new(handler);
        target.add_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())?;
        self.0.push((target.clone(), kind, handler));
        Ok(())
    }

    fn remove_all(&mut self) {
        for (target, kind, handler) in self.0.drain(..) {
            if let Err(err) =
                target.remove_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())
            {
                tracing::debug!(kind, error = ?err, "could not remove listener");
            }
        }
    }
}

fn millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

/// A `setTimeout` handle and the callback it will call.
type PendingTimeout = (i32, Closure<dyn FnMut()>);

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

struct Shell {
    window: Window,
    document: Document,
    source: DomSource,
    ui: PanelDom,
    store: UiStore<HostStorage>,
    clipboard: WebClipboard,
    nav: RefCell<Navigator<DomTurn>>,
    scan_timer: RefCell<TimerSlot<PendingTimeout>>,
    copied_timer: RefCell<TimerSlot<PendingTimeout>>,
    path: RefCell<PathWatcher>,
    drag: Cell<Option<DragAnchor>>,
    listeners: RefCell<Listeners>,
    observer: RefCell<Option<(MutationObserver, Closure<dyn FnMut(Array, MutationObserver)>)>>,
    poll: RefCell<Option<(i32, Closure<dyn FnMut()>)>>,
}

impl Shell {
    fn pathname(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn viewport(&self) -> Size {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Size::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn margin(&self) -> f64 {
        self.nav.borrow().config().panel_margin
    }

    fn set_timeout(&self, callback: &JsValue, delay: Duration) -> Option<i32> {
        let callback: &Function = callback.unchecked_ref();
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback, millis(delay))
        {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = ?err, "setTimeout failed");
                None
            }
        }
    }

    /// Arm `slot` with a new timeout, cancelling and releasing the previous
    /// one. The callback holds a `Weak` so a pending timer never keeps the
    /// shell alive; it stays in the slot until replaced or torn down.
    fn arm_timeout(
        self: &Rc<Self>,
        slot: &RefCell<TimerSlot<PendingTimeout>>,
        delay: Duration,
        fire: impl Fn(&Rc<Self>) + 'static,
    ) {
        let shell = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(shell) = Weak::upgrade(&shell) {
                fire(&shell);
            }
        });
        let Some(handle) = self.set_timeout(callback.as_ref(), delay) else {
            return;
        };
        let previous = slot.borrow_mut().rearm((handle, callback));
        if let Some((previous, stale)) = previous {
            self.window.clear_timeout_with_handle(previous);
            drop(stale);
        }
    }

    /// Carry out the host work an outcome asks for.
    fn apply(self: &Rc<Self>, outcome: Outcome) {
        let mut effects = outcome.effects;
        if let Some(jump) = outcome.jump {
            effects |= self.jump_to(&jump);
        }

        let (collapsed, toggle_label, filter) = {
            let nav = self.nav.borrow();
            let state = nav.state();
            (state.collapsed(), state.toggle_label(), state.filter().to_string())
        };
        if effects.contains(Effects::PANEL) {
            self.ui.update_panel(collapsed, toggle_label);
        }
        if effects.contains(Effects::SYNC_INPUT) {
            self.ui.sync_input(&filter);
        }
        if effects.contains(Effects::POSITION) {
            self.apply_position();
        }
        if effects.contains(Effects::RENDER) {
            self.render();
        }
        if effects.contains(Effects::FOCUS_FILTER) {
            self.ui.focus_filter();
        }
        if effects.contains(Effects::PERSIST) {
            self.persist();
        }
    }

    fn render(&self) {
        let view = self.nav.borrow_mut().state_mut().view();
        if let Err(err) = self.ui.render(&view) {
            tracing::warn!(error = ?err, "panel render failed");
        }
    }

    fn apply_position(&self) {
        let position = self.nav.borrow().state().position();
        let position = position.map(|pos| {
            let (_, size) = self.ui.bounds();
            let clamped = clamp_position(pos, size, self.viewport(), self.margin());
            let _ = self.nav.borrow_mut().state_mut().set_position(clamped);
            clamped
        });
        self.ui.apply_dock(&DockStyle::for_position(position));
    }

    fn persist(self: &Rc<Self>) {
        let snapshot = self.nav.borrow().state().persisted();
        let path = self.pathname();
        let shell = Rc::clone(self);
        spawn_local(async move {
            shell.store.save(&path, &snapshot).await;
        });
    }

    fn rescan(self: &Rc<Self>) {
        let outcome = self.nav.borrow_mut().rescan(&self.source);
        self.apply(outcome);
    }

    /// Trailing debounce: every call pushes the rescan back.
    fn schedule_rescan(self: &Rc<Self>) {
        let delay = self.nav.borrow().config().rescan_debounce();
        self.arm_timeout(&self.scan_timer, delay, |shell| shell.rescan());
    }

    /// Scroll to the jump target and flash it. Returns effects caused by a
    /// resync, if one was needed.
    fn jump_to(&self, jump: &Jump) -> Effects {
        let located = self.nav.borrow_mut().locate(&self.source, jump);
        match located.element {
            Some(turn) => self.scroll_and_flash(turn.element()),
            None => tracing::debug!(id = %jump.id, "jump target not on page"),
        }
        located.outcome.effects
    }

    fn scroll_and_flash(&self, el: &HtmlElement) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        options.set_inline(ScrollLogicalPosition::Nearest);
        el.scroll_into_view_with_scroll_into_view_options(&options);

        let classes = el.class_list();
        let _ = classes.remove_1(HIGHLIGHT_CLASS);
        // Reading layout restarts the animation on repeated jumps.
        let _ = el.offset_height();
        if let Err(err) = classes.add_1(HIGHLIGHT_CLASS) {
            tracing::debug!(error = ?err, "could not highlight turn");
            return;
        }

        let el = el.clone();
        let clear = Closure::once_into_js(move || {
            let _ = el.class_list().remove_1(HIGHLIGHT_CLASS);
        });
        let _ = self.set_timeout(&clear, self.nav.borrow().config().highlight());
    }

    fn copy_prompt(self: &Rc<Self>, id: PromptId) {
        let text = self
            .nav
            .borrow()
            .state()
            .prompts()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.full_text.clone());
        let Some(text) = text else {
            return;
        };
        let shell = Rc::clone(self);
        spawn_local(async move {
            if !copy_text(&text, &shell.clipboard).await {
                tracing::debug!(id = %id, "copy failed");
                return;
            }
            let outcome = shell.nav.borrow_mut().state_mut().mark_copied(&id);
            shell.apply(outcome);
            shell.schedule_copied_reset();
        });
    }

    fn schedule_copied_reset(self: &Rc<Self>) {
        let delay = self.nav.borrow().config().copied_reset();
        self.arm_timeout(&self.copied_timer, delay, |shell| {
            let outcome = shell.nav.borrow_mut().state_mut().clear_copied();
            shell.apply(outcome);
        });
    }

    fn on_keydown(self: &Rc<Self>, event: &KeyboardEvent) {
        let target = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlElement>().ok());
        let active = self
            .document
            .active_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let key_target = KeyTarget {
            editable: target.as_ref().is_some_and(is_editable),
            in_panel: target.as_ref().is_some_and(|el| self.ui.contains(el)),
            active_in_panel: active.as_ref().is_some_and(|el| self.ui.contains(el)),
        };
        let input = KeyInput::new(
            &event.key(),
            &event.code(),
            Modifiers::from_dom(
                event.shift_key(),
                event.alt_key(),
                event.ctrl_key(),
                event.meta_key(),
            ),
            event.repeat(),
        );

        let outcome = self.nav.borrow_mut().handle_key(&input, key_target);
        if outcome.wants(Effects::PREVENT_DEFAULT) {
            event.prevent_default();
        }
        self.apply(outcome);
    }

    fn on_list_click(self: &Rc<Self>, event: &Event) {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if let Ok(Some(copy)) = target.closest(&class_selector(COPY_CLASS)) {
            event.prevent_default();
            event.stop_propagation();
            if let Some(id) = copy.get_attribute(COPY_ID_ATTR) {
                self.copy_prompt(PromptId::from(id));
            }
            return;
        }
        if let Ok(Some(item)) = target.closest(&class_selector(ITEM_CLASS))
            && let Some(id) = item.get_attribute(PROMPT_ID_ATTR)
        {
            let outcome = self
                .nav
                .borrow_mut()
                .state_mut()
                .click_prompt(&PromptId::from(id));
            self.apply(outcome);
        }
    }

    fn on_drag_start(&self, event: &PointerEvent) {
        if event.button() != 0 {
            return;
        }
        let on_toggle = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(&id_selector(TOGGLE_ID)).ok().flatten())
            .is_some();
        if on_toggle {
            return;
        }

        let (origin, _) = self.ui.bounds();
        self.drag.set(Some(DragAnchor::new(
            event.pointer_id(),
            f64::from(event.client_x()),
            f64::from(event.client_y()),
            origin,
        )));
        self.ui.set_dragging(true);
        if let Err(err) = self.ui.header().set_pointer_capture(event.pointer_id()) {
            tracing::debug!(error = ?err, "pointer capture refused");
        }
        event.prevent_default();
    }

    fn active_drag(&self, event: &PointerEvent) -> Option<DragAnchor> {
        self.drag.get().filter(|d| d.pointer_id == event.pointer_id())
    }

    fn on_drag_move(self: &Rc<Self>, event: &PointerEvent) {
        let Some(anchor) = self.active_drag(event) else {
            return;
        };
        let (_, size) = self.ui.bounds();
        let origin = anchor.origin_for(f64::from(event.client_x()), f64::from(event.client_y()));
        let next = clamp_position(origin, size, self.viewport(), self.margin());
        let outcome = self.nav.borrow_mut().state_mut().set_position(next);
        self.apply(outcome);
    }

    fn on_drag_end(self: &Rc<Self>, event: &PointerEvent) {
        if self.active_drag(event).is_none() {
            return;
        }
        self.drag.set(None);
        self.ui.set_dragging(false);
        let outcome = self.nav.borrow_mut().state_mut().drag_finished();
        self.apply(outcome);
    }

    fn on_navigation_tick(self: &Rc<Self>) {
        let path = self.pathname();
        if !self.path.borrow_mut().observe(&path) {
            return;
        }
        self.nav.borrow_mut().state_mut().reset_for_navigation();
        let shell = Rc::clone(self);
        spawn_local(async move {
            let saved = shell.store.load(&path).await;
            let restored = shell.nav.borrow_mut().state_mut().restore(saved);
            let scanned = shell.nav.borrow_mut().rescan(&shell.source);
            shell.apply(restored.merge(scanned));
        });
    }

    fn install_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        let mut listeners = self.listeners.borrow_mut();
        let document: &EventTarget = &self.document;
        let window: &EventTarget = &self.window;
        let root: &EventTarget = self.ui.root();
        let header: &EventTarget = self.ui.header();
        let input: &EventTarget = self.ui.input();

        let shell = Rc::clone(self);
        listeners.add(self.ui.toggle(), "click", move |_| {
            let outcome = shell.nav.borrow_mut().state_mut().toggle_clicked();
            shell.apply(outcome);
        })?;

        let shell = Rc::clone(self);
        listeners.add(input, "input", move |_| {
            let value = shell.ui.input().value();
            let outcome = shell.nav.borrow_mut().state_mut().set_filter(&value);
            shell.apply(outcome);
        })?;

        let shell = Rc::clone(self);
        listeners.add(input, "focus", move |_| shell.nav.borrow_mut().state_mut().arm())?;

        let shell = Rc::clone(self);
        listeners.add(root, "pointerdown", move |_| {
            shell.nav.borrow_mut().state_mut().pointer_down(true);
        })?;

        let shell = Rc::clone(self);
        listeners.add(document, "pointerdown", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };
            if !shell.ui.contains(&target) {
                shell.nav.borrow_mut().state_mut().pointer_down(false);
            }
        })?;

        let shell = Rc::clone(self);
        listeners.add(document, "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                shell.on_keydown(event);
            }
        })?;

        let shell = Rc::clone(self);
        listeners.add(self.ui.list(), "click", move |event| shell.on_list_click(&event))?;

        let shell = Rc::clone(self);
        listeners.add(header, "pointerdown", move |event| {
            if let Some(event) = event.dyn_ref::<PointerEvent>() {
                shell.on_drag_start(event);
            }
        })?;

        let shell = Rc::clone(self);
        listeners.add(header, "pointermove", move |event| {
            if let Some(event) = event.dyn_ref::<PointerEvent>() {
                shell.on_drag_move(event);
            }
        })?;

        for kind in ["pointerup", "pointercancel"] {
            let shell = Rc::clone(self);
            listeners.add(header, kind, move |event| {
                if let Some(event) = event.dyn_ref::<PointerEvent>() {
                    shell.on_drag_end(event);
                }
            })?;
        }

        let shell = Rc::clone(self);
        listeners.add(window, "resize", move |_| {
            if shell.nav.borrow().state().position().is_some() {
                shell.apply_position();
            }
        })?;

        Ok(())
    }

    fn start_observer(self: &Rc<Self>) -> Result<(), JsValue> {
        let body = self.document.body().ok_or("document has no body")?;
        let shell = Rc::clone(self);
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let relevant = records
                    .iter()
                    .filter_map(|r| r.dyn_into::<MutationRecord>().ok())
                    .any(|r| matches!(r.type_().as_str(), "childList" | "characterData"));
                if relevant {
                    shell.schedule_rescan();
                }
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_subtree(true);
        init.set_child_list(true);
        init.set_character_data(true);
        observer.observe_with_options(&body, &init)?;
        *self.observer.borrow_mut() = Some((observer, callback));
        Ok(())
    }

    fn start_navigation_poll(self: &Rc<Self>) -> Result<(), JsValue> {
        let shell = Rc::clone(self);
        let tick = Closure::<dyn FnMut()>::new(move || shell.on_navigation_tick());
        let interval = millis(self.nav.borrow().config().navigation_poll());
        let handle = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                interval,
            )?;
        *self.poll.borrow_mut() = Some((handle, tick));
        Ok(())
    }

    /// Detach everything and remove the panel. Breaks the `Rc` cycles held by
    /// the listener closures.
    fn teardown(&self) {
        self.listeners.borrow_mut().remove_all();
        if let Some((observer, _callback)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
        if let Some((handle, _tick)) = self.poll.borrow_mut().take() {
            self.window.clear_interval_with_handle(handle);
        }
        for slot in [&self.scan_timer, &self.copied_timer] {
            let pending = slot.borrow_mut().take();
            if let Some((handle, _callback)) = pending {
                self.window.clear_timeout_with_handle(handle);
            }
        }
        self.ui.remove();
    }
}

async fn dom_ready(document: &Document) -> Result<(), JsValue> {
    if document.ready_state() != "loading" {
        return Ok(());
    }
    let mut listen_error = None;
    let ready = Promise::new(&mut |resolve, _reject| {
        let callback = Closure::once_into_js(move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
        if let Err(err) =
            document.add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
        {
            listen_error = Some(err);
        }
    });
    if let Some(err) = listen_error {
        return Err(err);
    }
    JsFuture::from(ready).await.map(|_| ())
}

fn decode_options(options: Option<&JsValue>) -> Result<StartOptions, String> {
    let Some(options) = options.filter(|v| !v.is_undefined() && !v.is_null()) else {
        return Ok(StartOptions::default());
    };
    let json = JSON::stringify(options)
        .ok()
        .and_then(|s| s.as_string())
        .ok_or_else(|| "options are not JSON-serializable".to_string())?;
    StartOptions::parse(&json).map_err(|err| err.to_string())
}

// ---------------------------------------------------------------------------
// JS surface
// ---------------------------------------------------------------------------

/// Prompt navigator overlay, exported to JS.
#[wasm_bindgen]
pub struct PromptNavigator {
    shell: Option<Rc<Shell>>,
}

#[wasm_bindgen]
impl PromptNavigator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { shell: None }
    }

    /// Wait for the DOM, restore saved state, install the panel and start
    /// watching the page.
    ///
    /// `options` is an optional plain object with any navigator setting plus
    /// `log_level`. Calling `init` again on a running instance is a no-op.
    pub async fn init(&mut self, options: Option<JsValue>) -> Result<(), JsValue> {
        if self.shell.is_some() {
            return Ok(());
        }
        let decoded = decode_options(options.as_ref());
        let options = decoded.clone().unwrap_or_default();
        install_logging(options.max_level());
        if let Err(err) = decoded {
            tracing::warn!(error = %err, "invalid navigator options; using defaults");
        }

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        dom_ready(&document).await?;

        let config = options.navigator;
        let store = UiStore::new(HostStorage::detect(), config.storage_prefix.clone());
        let path = window.location().pathname().unwrap_or_default();
        let saved = store.load(&path).await;

        if PanelDom::exists(&document) {
            tracing::info!("prompt navigator already installed on this page");
            return Ok(());
        }

        let mut nav = Navigator::new(config);
        let _ = nav.state_mut().restore(saved);
        nav.state_mut().arm();
        let ui = PanelDom::install(&document, &nav.config().toggle_code)?;

        let shell = Rc::new(Shell {
            source: DomSource::new(document.clone()),
            clipboard: WebClipboard::new(window.clone(), document.clone()),
            ui,
            store,
            nav: RefCell::new(nav),
            scan_timer: RefCell::new(TimerSlot::new()),
            copied_timer: RefCell::new(TimerSlot::new()),
            path: RefCell::new(PathWatcher::new(path.clone())),
            drag: Cell::new(None),
            listeners: RefCell::new(Listeners::default()),
            observer: RefCell::new(None),
            poll: RefCell::new(None),
            window,
            document,
        });

        if let Err(err) = shell
            .install_listeners()
            .and_then(|()| shell.start_observer())
            .and_then(|()| shell.start_navigation_poll())
        {
            shell.teardown();
            return Err(err);
        }

        shell.apply(Outcome::with(
            Effects::PANEL | Effects::SYNC_INPUT | Effects::POSITION | Effects::RENDER,
        ));
        shell.rescan();
        tracing::info!(
            path = %path,
            backend = shell.store.backend().name(),
            prompts = shell.nav.borrow().state().prompts().len(),
            "prompt navigator ready"
        );
        self.shell = Some(shell);
        Ok(())
    }

    /// Rescan the page now instead of waiting for the next mutation.
    pub fn rescan(&self) {
        if let Some(shell) = &self.shell {
            shell.rescan();
        }
    }

    #[wasm_bindgen(js_name = promptCount)]
    pub fn prompt_count(&self) -> usize {
        self.shell
            .as_ref()
            .map_or(0, |shell| shell.nav.borrow().state().prompts().len())
    }

    /// Current position of a dragged panel as `{x, y}`, or `null` when docked.
    #[wasm_bindgen(js_name = panelPosition)]
    pub fn panel_position(&self) -> JsValue {
        let position: Option<Position> = self
            .shell
            .as_ref()
            .and_then(|shell| shell.nav.borrow().state().position());
        match position.and_then(|p| serde_json::to_string(&p).ok()) {
            Some(json) => JSON::parse(&json).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Remove the panel and stop all listeners, observers and timers.
    pub fn destroy(&mut self) {
        if let Some(shell) = self.shell.take() {
            shell.teardown();
            tracing::debug!("prompt navigator destroyed");
        }
    }
}

impl Default for PromptNavigator {
    fn default() -> Self {
        Self::new()
    }
}
