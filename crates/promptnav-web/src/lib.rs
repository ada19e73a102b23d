#![forbid(unsafe_code)]

//! Browser shell for the Prompt Navigator overlay.
//!
//! The decision logic lives in `promptnav-core`. This crate adapts it to a
//! live page:
//! - DOM turns exposed through the core's scanning traits,
//! - panel construction, rendering and event wiring,
//! - `chrome.storage.local` persistence with an in-memory fallback,
//! - clipboard access with the legacy `execCommand` fallback,
//! - `MutationObserver` rescans and client-side navigation polling,
//! - `tracing` output on the browser console.

pub mod console;
pub mod markup;
pub mod options;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod panel;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::PromptNavigator;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct PromptNavigator;

#[cfg(not(target_arch = "wasm32"))]
impl PromptNavigator {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
