#![forbid(unsafe_code)]

//! Copy-to-clipboard with a two-tier fallback.
//!
//! The platform primitives are injected through [`ClipboardPrimitives`] so the
//! orchestration in [`copy_text`] can be exercised without a real clipboard.
//!
//! | Tier | Default in the browser | Failure handling |
//! |------|------------------------|------------------|
//! | primary | `navigator.clipboard.writeText` | any error falls through |
//! | fallback | hidden textarea + `execCommand("copy")` | error reports `false` |

use std::future::Future;

/// Clipboard errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The primitive does not exist in this host.
    NotAvailable,
    /// The primitive exists but the write was rejected.
    WriteError(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAvailable => write!(f, "clipboard not available"),
            Self::WriteError(msg) => write!(f, "clipboard write failed: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Host clipboard mechanisms.
pub trait ClipboardPrimitives {
    /// Asynchronous platform clipboard write.
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>>;

    /// Legacy synchronous copy. `Ok(false)` means the host refused the copy.
    fn exec_copy(&self, text: &str) -> Result<bool, ClipboardError>;
}

/// Copy `text`, falling back to the legacy mechanism when the primary fails.
///
/// Empty text returns `false` without touching either primitive.
pub async fn copy_text<C: ClipboardPrimitives>(text: &str, clipboard: &C) -> bool {
    if text.is_empty() {
        return false;
    }

    match clipboard.write_text(text).await {
        Ok(()) => {
            crate::trace!(bytes = text.len(), "clipboard write");
            return true;
        }
        Err(err) => {
            crate::debug!(error = %err, "primary clipboard write failed; trying fallback");
        }
    }

    match clipboard.exec_copy(text) {
        Ok(copied) => copied,
        Err(err) => {
            crate::debug!(error = %err, "fallback clipboard copy failed");
            false
        }
    }
}
