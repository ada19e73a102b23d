#![forbid(unsafe_code)]

//! Options accepted by the JavaScript entry point.

use promptnav_core::NavigatorConfig;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Navigator configuration plus shell-only knobs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StartOptions {
    #[serde(flatten)]
    pub navigator: NavigatorConfig,
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub log_level: Option<String>,
}

impl StartOptions {
    /// Parse the JSON form of the options object.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let mut options = serde_json::from_str::<Self>(json)?;
        options.navigator = options.navigator.sanitized();
        Ok(options)
    }

    /// Console verbosity. `info` unless a valid level was given.
    #[must_use]
    pub fn max_level(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|level| level.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flattened_navigator_fields() {
        let options = StartOptions::parse(
            r#"{"max_preview": 40, "toggle_code": "KeyK", "log_level": "debug"}"#,
        )
        .expect("valid options");
        assert_eq!(options.navigator.max_preview, 40);
        assert_eq!(options.navigator.toggle_code, "KeyK");
        assert_eq!(options.navigator.rescan_debounce_ms, 150);
        assert_eq!(options.max_level(), LevelFilter::DEBUG);
    }

    #[test]
    fn empty_object_is_default() {
        let options = StartOptions::parse("{}").expect("valid options");
        assert_eq!(options, StartOptions::default());
        assert_eq!(options.max_level(), LevelFilter::INFO);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(StartOptions::parse("nope").is_err());
        assert!(StartOptions::parse(r#"{"max_preview": "long"}"#).is_err());
    }

    #[test]
    fn parse_reports_errors() {
        assert!(StartOptions::parse("[1, 2]").is_err());
        assert!(StartOptions::parse(r#"{"log_level": "warn"}"#).is_ok());
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let options = StartOptions {
            log_level: Some("chatty".into()),
            ..StartOptions::default()
        };
        assert_eq!(options.max_level(), LevelFilter::INFO);
        let off = StartOptions {
            log_level: Some("off".into()),
            ..StartOptions::default()
        };
        assert_eq!(off.max_level(), LevelFilter::OFF);
    }

    #[test]
    fn invalid_margin_is_sanitized() {
        let options = StartOptions::parse(r#"{"panel_margin": -3}"#).expect("valid options");
        assert_eq!(options.navigator.panel_margin, 8.0);
    }
}
