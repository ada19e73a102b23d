#![forbid(unsafe_code)]

//! Host services: extension storage and the clipboard.

use js_sys::{Array, Function, JSON, Object, Promise, Reflect};
use promptnav_core::clipboard::{ClipboardError, ClipboardPrimitives};
use promptnav_core::persistence::{MemoryStorage, StorageBackend, StorageError, StorageResult};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlDocument, HtmlTextAreaElement, Window};

fn js_err(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| Reflect::get(err, &"message".into()).ok().and_then(|m| m.as_string()))
        .unwrap_or_else(|| format!("{err:?}"))
}

/// `obj[name]`, treating `undefined` and `null` as absent.
fn get_prop(obj: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(obj, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_fn(obj: &JsValue, name: &str) -> Option<Function> {
    get_prop(obj, name)?.dyn_into::<Function>().ok()
}

fn json_to_js(value: &Value) -> StorageResult<JsValue> {
    let text = serde_json::to_string(value)?;
    JSON::parse(&text).map_err(|e| StorageError::Serialization(js_err(&e)))
}

fn js_to_json(value: &JsValue) -> StorageResult<Value> {
    let text = JSON::stringify(value)
        .map_err(|e| StorageError::Serialization(js_err(&e)))?
        .as_string()
        .ok_or_else(|| StorageError::Serialization("value is not JSON".into()))?;
    Ok(serde_json::from_str(&text)?)
}

// ---------------------------------------------------------------------------
// chrome.storage.local
// ---------------------------------------------------------------------------

/// `chrome.storage.local`, wrapped in promises.
#[derive(Debug, Clone)]
pub struct ChromeStorage {
    local: JsValue,
}

impl ChromeStorage {
    /// The extension storage area, if this page has one.
    pub fn detect() -> Option<Self> {
        let chrome = get_prop(&js_sys::global(), "chrome")?;
        let local = get_prop(&get_prop(&chrome, "storage")?, "local")?;
        Some(Self { local })
    }

    /// Call `local[method](arg, callback)` and settle on the callback, failing
    /// when `chrome.runtime.lastError` is set.
    async fn call(&self, method: &str, arg: &JsValue) -> StorageResult<JsValue> {
        let func = get_fn(&self.local, method)
            .ok_or_else(|| StorageError::Unavailable(format!("chrome.storage.local.{method}")))?;
        let local = self.local.clone();
        let arg = arg.clone();
        let mut call_error = None;
        let promise = Promise::new(&mut |resolve, reject| {
            let callback = Closure::once_into_js(move |result: JsValue| {
                let settled = match last_error() {
                    Some(err) => reject.call1(&JsValue::NULL, &err),
                    None => resolve.call1(&JsValue::NULL, &result),
                };
                if let Err(err) = settled {
                    tracing::debug!(error = %js_err(&err), "storage callback failed to settle");
                }
            });
            if let Err(err) = func.call2(&local, &arg, &callback) {
                call_error = Some(js_err(&err));
            }
        });
        if let Some(err) = call_error {
            return Err(StorageError::Host(err));
        }
        JsFuture::from(promise)
            .await
            .map_err(|err| StorageError::Host(js_err(&err)))
    }
}

fn last_error() -> Option<JsValue> {
    let chrome = get_prop(&js_sys::global(), "chrome")?;
    get_prop(&get_prop(&chrome, "runtime")?, "lastError")
}

impl StorageBackend for ChromeStorage {
    fn name(&self) -> &str {
        "chrome.storage.local"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let keys = Array::of1(&JsValue::from_str(key));
        let items = self.call("get", &keys).await?;
        match get_prop(&items, key) {
            Some(value) => js_to_json(&value).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &json_to_js(&value)?)
            .map_err(|e| StorageError::Host(js_err(&e)))?;
        self.call("set", &items).await.map(|_| ())
    }
}

/// Extension storage when present, session memory otherwise.
#[derive(Debug)]
pub enum HostStorage {
    Chrome(ChromeStorage),
    Memory(MemoryStorage),
}

impl HostStorage {
    pub fn detect() -> Self {
        match ChromeStorage::detect() {
            Some(chrome) => Self::Chrome(chrome),
            None => {
                tracing::debug!("chrome.storage unavailable; keeping panel state in memory");
                Self::Memory(MemoryStorage::new())
            }
        }
    }
}

impl StorageBackend for HostStorage {
    fn name(&self) -> &str {
        match self {
            Self::Chrome(chrome) => chrome.name(),
            Self::Memory(memory) => memory.name(),
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        match self {
            Self::Chrome(chrome) => chrome.get(key).await,
            Self::Memory(memory) => memory.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        match self {
            Self::Chrome(chrome) => chrome.set(key, value).await,
            Self::Memory(memory) => memory.set(key, value).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

/// `navigator.clipboard.writeText` with a hidden-textarea fallback.
#[derive(Debug, Clone)]
pub struct WebClipboard {
    window: Window,
    document: Document,
}

impl WebClipboard {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }
}

impl ClipboardPrimitives for WebClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let clipboard =
            get_prop(&self.window.navigator(), "clipboard").ok_or(ClipboardError::NotAvailable)?;
        let write = get_fn(&clipboard, "writeText").ok_or(ClipboardError::NotAvailable)?;
        let promise = write
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(|e| ClipboardError::WriteError(js_err(&e)))?
            .dyn_into::<Promise>()
            .map_err(|_| ClipboardError::WriteError("writeText did not return a promise".into()))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| ClipboardError::WriteError(js_err(&e)))
    }

    fn exec_copy(&self, text: &str) -> Result<bool, ClipboardError> {
        let html = self
            .document
            .dyn_ref::<HtmlDocument>()
            .ok_or(ClipboardError::NotAvailable)?;
        let body = self.document.body().ok_or(ClipboardError::NotAvailable)?;
        let write_err = |e: JsValue| ClipboardError::WriteError(js_err(&e));

        let area = self
            .document
            .create_element("textarea")
            .map_err(write_err)?
            .dyn_into::<HtmlTextAreaElement>()
            .map_err(|_| ClipboardError::NotAvailable)?;
        area.set_value(text);
        area.set_attribute("readonly", "").map_err(write_err)?;
        let style = area.style();
        for (prop, value) in [("position", "fixed"), ("opacity", "0"), ("left", "-9999px")] {
            style.set_property(prop, value).map_err(write_err)?;
        }

        body.append_child(&area).map_err(write_err)?;
        area.select();
        let copied = html.exec_command("copy");
        if let Err(err) = body.remove_child(&area) {
            tracing::debug!(error = %js_err(&err), "could not remove copy textarea");
        }
        copied.map_err(write_err)
    }
}
