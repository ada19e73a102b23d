#![forbid(unsafe_code)]

//! Tracing integration for the browser console.
//!
//! [`ConsoleLayer`] formats each event as `LEVEL target: message key=value`
//! and hands the line to a [`ConsoleSink`]. The wasm build routes lines to
//! `console.debug/info/warn/error`; tests capture them in memory.

use std::fmt::{self, Write as FmtWrite};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Destination for formatted log lines.
pub trait ConsoleSink: Send + Sync + 'static {
    fn write_line(&self, level: Level, line: &str);
}

/// Which parts of an event end up in the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleFormat {
    pub show_level: bool,
    pub show_target: bool,
    /// Structured fields beyond `message`.
    pub show_fields: bool,
}

impl Default for ConsoleFormat {
    fn default() -> Self {
        Self {
            show_level: true,
            show_target: true,
            show_fields: true,
        }
    }
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl EventVisitor {
    fn record(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        self.record(field, strip_debug_quotes(&rendered));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.to_string());
    }
}

fn strip_debug_quotes(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}

/// Build one console line.
#[must_use]
pub fn format_line(
    format: &ConsoleFormat,
    level: Level,
    target: &str,
    message: &str,
    fields: &[(String, String)],
) -> String {
    let mut line = String::new();
    if format.show_level {
        line.push_str(level_str(level));
        line.push(' ');
    }
    if format.show_target {
        let _ = write!(line, "{target}: ");
    }
    line.push_str(message);
    if format.show_fields {
        for (key, value) in fields {
            let _ = write!(line, " {key}={value}");
        }
    }
    line
}

/// A `tracing_subscriber` layer writing formatted events to a [`ConsoleSink`].
pub struct ConsoleLayer<W> {
    sink: W,
    format: ConsoleFormat,
}

impl<W: ConsoleSink> ConsoleLayer<W> {
    pub fn new(sink: W) -> Self {
        Self::with_format(sink, ConsoleFormat::default())
    }

    pub fn with_format(sink: W, format: ConsoleFormat) -> Self {
        Self { sink, format }
    }

    #[must_use]
    pub fn show_target(mut self, show: bool) -> Self {
        self.format.show_target = show;
        self
    }

    #[must_use]
    pub fn show_fields(mut self, show: bool) -> Self {
        self.format.show_fields = show;
        self
    }

    fn write_event(&self, event: &Event<'_>) {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let line = format_line(
            &self.format,
            *metadata.level(),
            metadata.target(),
            visitor.message.as_deref().unwrap_or_default(),
            &visitor.fields,
        );
        self.sink.write_line(*metadata.level(), &line);
    }
}

impl<S, W> Layer<S> for ConsoleLayer<W>
where
    S: Subscriber,
    W: ConsoleSink,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.write_event(event);
    }
}
