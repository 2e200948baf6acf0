//! Logging configuration
//!
//! Controls how the receiver reports its own activity (not the syslog
//! traffic it receives).

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every frame and datagram
    Trace,
    /// Connection lifecycle
    Debug,
    /// Startup, shutdown and summaries (default)
    #[default]
    Info,
    /// Reported receive errors
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter directive
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// One JSON object per event
    Json,
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level
    /// Default: info
    pub level: LogLevel,

    /// Output format
    /// Default: console
    pub format: LogFormat,

    /// Colored console output
    /// Default: true
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Console,
            ansi: true,
        }
    }
}
