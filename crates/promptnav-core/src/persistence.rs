#![forbid(unsafe_code)]

//! Per-page persistence of the panel's collapsed flag, filter and position.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UiStore                              │
//! │   - Derives the key from the page path                       │
//! │   - Encodes/decodes PersistedUi, tolerating malformed data   │
//! │   - Swallows backend failures (logged)                       │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      StorageBackend                          │
//! │   - MemoryStorage: session-only                              │
//! │   - extension storage (provided by the web shell)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Backend missing | Shell substitutes `MemoryStorage` |
//! | `get`/`set` error | Logged, load yields `None`, save is dropped |
//! | Stored value not an object | Treated as nothing stored |
//! | Field of the wrong type | That field falls back to its default |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::geometry::Position;

/// Default key prefix; the page path is appended.
pub const DEFAULT_STORAGE_PREFIX: &str = "prompt-nav:";

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The host has no storage capability.
    Unavailable(String),
    /// Encoding or decoding failed.
    Serialization(String),
    /// The host reported a failure (for example `runtime.lastError`).
    Host(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Host(msg) => write!(f, "storage host error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Asynchronous key-value storage.
///
/// Backends run on the page's single UI thread, so nothing here is `Send`.
pub trait StorageBackend {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read one value. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> impl Future<Output = StorageResult<Option<Value>>>;

    /// Write one value, replacing any previous one.
    fn set(&self, key: &str, value: Value) -> impl Future<Output = StorageResult<()>>;
}

/// Session-only storage, used when the host offers nothing better.
#[derive(Default)]
pub struct MemoryStorage {
    data: RefCell<HashMap<String, Value>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory storage pre-populated with entries.
    #[must_use]
    pub fn with_entries(entries: HashMap<String, Value>) -> Self {
        Self {
            data: RefCell::new(entries),
        }
    }

    /// Synchronous peek, for tests and diagnostics.
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.data.borrow().get(key).cloned()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.data.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.data.borrow().len())
            .finish()
    }
}

/// Storage key for the page at `path`.
#[must_use]
pub fn storage_key(prefix: &str, path: &str) -> String {
    format!("{prefix}{path}")
}

/// The persisted subset of panel state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PersistedUi {
    pub collapsed: bool,
    pub filter: String,
    pub position: Option<Position>,
}

impl PersistedUi {
    /// Decode a stored value field by field.
    ///
    /// Returns `None` when `value` is not an object. Each field that has the
    /// wrong type decays to its default instead of rejecting the whole record.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let collapsed = map.get("collapsed").is_some_and(is_truthy);
        let filter = map
            .get("filter")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let position = map.get("position").and_then(decode_position);
        Some(Self {
            collapsed,
            filter,
            position,
        })
    }

    pub fn to_value(&self) -> StorageResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Boolean coercion matching what a script host would apply to the field.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn decode_position(value: &Value) -> Option<Position> {
    let map = value.as_object()?;
    let x = map.get("x")?.as_f64()?;
    let y = map.get("y")?.as_f64()?;
    let pos = Position::new(x, y);
    pos.is_finite().then_some(pos)
}

/// Path-scoped persistence on top of a [`StorageBackend`].
#[derive(Debug)]
pub struct UiStore<B> {
    backend: B,
    prefix: String,
}

impl<B: StorageBackend> UiStore<B> {
    pub fn new(backend: B, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn key_for(&self, path: &str) -> String {
        storage_key(&self.prefix, path)
    }

    /// Load the state saved for `path`. Any failure reads as "nothing saved".
    pub async fn load(&self, path: &str) -> Option<PersistedUi> {
        let key = self.key_for(path);
        match self.backend.get(&key).await {
            Ok(Some(value)) => {
                let decoded = PersistedUi::from_value(&value);
                if decoded.is_none() {
                    crate::warn!(key = %key, "ignoring malformed persisted panel state");
                }
                decoded
            }
            Ok(None) => None,
            Err(err) => {
                crate::debug!(backend = self.backend.name(), error = %err, "storage read failed");
                None
            }
        }
    }

    /// Save `state` for `path`. Failures are logged and dropped.
    pub async fn save(&self, path: &str, state: &PersistedUi) {
        let key = self.key_for(path);
        let value = match state.to_value() {
            Ok(value) => value,
            Err(err) => {
                crate::warn!(error = %err, "could not encode panel state");
                return;
            }
        };
        if let Err(err) = self.backend.set(&key, value).await {
            crate::debug!(backend = self.backend.name(), error = %err, "storage write failed");
        }
    }
}
