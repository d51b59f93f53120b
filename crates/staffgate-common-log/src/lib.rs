//! Logging infrastructure for StaffGate.

use std::io;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub mod spans;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Log file path (if file logging enabled).
    pub file_path: Option<PathBuf>,
    /// Include source location.
    pub source_location: bool,
    /// Include span open/close events.
    pub span_events: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON structured format, one object per line.
    Json,
}

impl LogFormat {
    /// Parse from string, defaulting to pretty.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            file_path: None,
            source_location: false,
            span_events: false,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl LogConfig {
    /// Create config from `STAFFGATE_LOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let level = lookup("STAFFGATE_LOG_LEVEL").or_else(|| lookup("RUST_LOG"));
        if let Some(level) = level.as_deref().and_then(LogLevel::parse) {
            config.level = level;
        }
        if let Some(format) = lookup("STAFFGATE_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Some(path) = lookup("STAFFGATE_LOG_FILE") {
            config.file_path = Some(PathBuf::from(path));
        }
        if let Some(source) = lookup("STAFFGATE_LOG_SOURCE") {
            config.source_location = flag(&source);
        }
        if let Some(spans) = lookup("STAFFGATE_LOG_SPANS") {
            config.span_events = flag(&spans);
        }

        config
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn stderr_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_span_events(self.fmt_span());

        match self.format {
            LogFormat::Pretty => layer.with_ansi(true).boxed(),
            LogFormat::Compact => layer.compact().with_ansi(true).boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }

    fn file_layer<S>(&self) -> Result<Option<Box<dyn Layer<S> + Send + Sync>>, LogError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let Some(path) = &self.file_path else {
            return Ok(None);
        };

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_span_events(self.fmt_span());

        Ok(Some(match self.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.boxed(),
        }))
    }
}

/// Initialize the global subscriber with the given configuration.
pub fn init(config: LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let registry = tracing_subscriber::registry().with(filter);
    let stderr = config.stderr_layer();
    let file = config.file_layer()?;

    registry
        .with(stderr)
        .with(file)
        .try_init()
        .map_err(|e| LogError::InitError(e.to_string()))
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    #[error("failed to open log file: {0}")]
    FileError(#[from] io::Error),
}

pub use tracing::{debug, error, info, trace, warn};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("Warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("invalid"), None);
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file_path.is_none());
        assert!(!config.source_location);
        assert!(!config.span_events);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = LogConfig::from_lookup(lookup(&[
            ("STAFFGATE_LOG_LEVEL", "debug"),
            ("STAFFGATE_LOG_FORMAT", "json"),
            ("STAFFGATE_LOG_FILE", "/tmp/staffgate.log"),
            ("STAFFGATE_LOG_SOURCE", "true"),
            ("STAFFGATE_LOG_SPANS", "1"),
        ]));

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/staffgate.log")));
        assert!(config.source_location);
        assert!(config.span_events);
    }

    #[test]
    fn test_rust_log_fallback() {
        let config = LogConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn test_staffgate_level_wins_over_rust_log() {
        let config = LogConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("STAFFGATE_LOG_LEVEL", "error"),
        ]));
        assert_eq!(config.level, LogLevel::Error);
    }
}
