//! Logging setup
//!
//! Library code only emits `tracing` events. The binary picks the level and
//! format from the command line, then `BFC_LOG` / `BFC_LOG_FORMAT`, then the
//! defaults below.

use std::env;
use std::fmt;

pub const LEVEL_ENV: &str = "BFC_LOG";
pub const FORMAT_ENV: &str = "BFC_LOG_FORMAT";

/// Output format for log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LogOptions {
    /// Combine command line values with the environment. Unparseable
    /// environment values are ignored.
    pub fn resolve(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        let env_level = env::var(LEVEL_ENV).ok();
        let env_format = env::var(FORMAT_ENV).ok();
        Self::with_env(level, format, env_level.as_deref(), env_format.as_deref())
    }

    fn with_env(
        level: Option<LogLevel>,
        format: Option<LogFormat>,
        env_level: Option<&str>,
        env_format: Option<&str>,
    ) -> Self {
        Self {
            level: level
                .or_else(|| env_level.and_then(LogLevel::parse))
                .unwrap_or_default(),
            format: format
                .or_else(|| env_format.and_then(LogFormat::parse))
                .unwrap_or_default(),
        }
    }
}

/// Install the global subscriber. Logs go to stderr so generated output
/// and debug dumps on stdout stay clean.
pub fn init(options: LogOptions) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::new(options.level.to_string());
    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let result = match options.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Text => tracing::subscriber::set_global_default(builder.compact().finish()),
    };
    if result.is_err() {
        tracing::debug!(target: "logging", "subscriber already installed");
    }
}
