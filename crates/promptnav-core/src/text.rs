#![forbid(unsafe_code)]

//! Whitespace normalization and preview truncation for prompt text.

/// Preview budget used when no explicit limit is given.
pub const DEFAULT_PREVIEW_CHARS: usize = 110;

/// Ellipsis appended to truncated previews.
pub const ELLIPSIS: char = '\u{2026}';

/// Collapse every run of whitespace into a single space and trim both ends.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Normalize `text` and bound it to `max_chars` characters.
///
/// Over-long text keeps its first `max_chars - 1` characters followed by
/// [`ELLIPSIS`]. `None` selects [`DEFAULT_PREVIEW_CHARS`]. Lengths are counted
/// in `char`s, never bytes, so multi-byte text is never split.
#[must_use]
pub fn truncate(text: &str, max_chars: Option<usize>) -> String {
    let limit = max_chars.unwrap_or(DEFAULT_PREVIEW_CHARS);
    let normalized = normalize(text);
    if normalized.chars().count() <= limit {
        return normalized;
    }
    if limit == 0 {
        return String::new();
    }
    let mut out: String = normalized.chars().take(limit - 1).collect();
    out.push(ELLIPSIS);
    out
}
