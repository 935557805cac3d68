//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Filter used when neither `RUST_LOG` nor settings provide one.
const DEFAULT_FILTER: &str = "warn";

/// Filter used with `--verbose`.
const VERBOSE_FILTER: &str = "slipcheck=debug,info";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything unrecognised is `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Event format.
    pub format: LogFormat,
    /// Append events to this file instead of stderr.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive.
    pub filter: String,
}

impl LoggingConfig {
    /// Builds logging configuration from settings.
    ///
    /// Filter precedence: `RUST_LOG`, then `verbose`, then the settings
    /// filter, then a quiet default.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let env_filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::resolve(settings, verbose, env_filter)
    }

    fn resolve(settings: &LoggingSettings, verbose: bool, env_filter: Option<String>) -> Self {
        let filter = env_filter
            .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
            .or_else(|| settings.filter.clone())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            format: settings
                .format
                .as_deref()
                .map_or(LogFormat::Pretty, LogFormat::parse),
            file: settings.file.clone(),
            filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Pretty);
    }

    #[test]
    fn test_filter_precedence() {
        let settings = LoggingSettings {
            filter: Some("slipcheck=trace".to_string()),
            ..LoggingSettings::default()
        };

        let from_env = LoggingConfig::resolve(&settings, true, Some("error".to_string()));
        assert_eq!(from_env.filter, "error");

        let verbose = LoggingConfig::resolve(&settings, true, None);
        assert_eq!(verbose.filter, VERBOSE_FILTER);

        let configured = LoggingConfig::resolve(&settings, false, None);
        assert_eq!(configured.filter, "slipcheck=trace");

        let fallback = LoggingConfig::resolve(&LoggingSettings::default(), false, None);
        assert_eq!(fallback.filter, DEFAULT_FILTER);
        assert_eq!(fallback.format, LogFormat::Pretty);
        assert!(fallback.file.is_none());
    }
}
