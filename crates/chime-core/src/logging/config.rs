//! Logging configuration.
//!
//! Resolved from, in increasing priority:
//! - `RUST_LOG` (only its level keyword is honoured)
//! - `CHIME_LOG` / `CHIME_LOG_FORMAT` / `CHIME_LOG_TIMESTAMPS`
//! - CLI flags (`-v`, `-q`, `--log-format`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines (default).
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" | "text" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

/// Minimum level that reaches stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default: a hook invocation should print nothing on success.
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Level implied by `-v` repetitions and `-q`.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Prefix human-format lines with a timestamp.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Warn,
            timestamps: false,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment plus CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_vars(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn from_vars<F>(lookup: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(level) = lookup("CHIME_LOG").and_then(|v| v.parse().ok()) {
            config.level = level;
        } else if let Some(val) = lookup("RUST_LOG") {
            // Directive strings like "chime_core=debug" only contribute their level
            if let Some(level) = ["trace", "debug", "info", "warn", "error"]
                .into_iter()
                .find(|kw| val.contains(kw))
                .and_then(|kw| kw.parse().ok())
            {
                config.level = level;
            }
        }

        if let Some(format) = lookup("CHIME_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        if let Some(val) = lookup("CHIME_LOG_TIMESTAMPS") {
            config.timestamps = matches!(
                val.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Some(level) = cli_level {
            config.level = level;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }

        config
    }
}
