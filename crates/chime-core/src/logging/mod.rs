//! Logging infrastructure for chime.
//!
//! All diagnostics go to stderr, as do `--debug` detection traces. stdout is
//! reserved for command output such as status tables and JSON reports.
//!
//! # Formats
//!
//! - **Human** (default): compact lines without target or thread noise
//! - **JSONL**: one JSON object per event, for log collectors
//!
//! # Environment
//!
//! - `CHIME_LOG`: level (trace, debug, info, warn, error, off)
//! - `CHIME_LOG_FORMAT`: human or jsonl
//! - `CHIME_LOG_TIMESTAMPS`: `1`/`true` to prefix human lines with a timestamp
//! - `RUST_LOG`: honoured for its level keyword when `CHIME_LOG` is unset

mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Crates whose events are let through the filter.
const LOG_TARGETS: &[&str] = &["chime_core", "chime", "chime_common"];

fn build_filter(level: LogLevel) -> EnvFilter {
    let directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(directives)
}

/// Initialize the global subscriber.
///
/// Only the first call has an effect; later calls (and a subscriber already
/// installed by a test harness) are ignored.
pub fn init_logging(config: &LogConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        let result = match config.format {
            LogFormat::Human => {
                let layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(std::io::stderr().is_terminal());
                if config.timestamps {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .try_init()
                } else {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer.without_time())
                        .try_init()
                }
            }
            LogFormat::Jsonl => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(false),
                )
                .try_init(),
        };

        if let Err(err) = result {
            eprintln!("chime: logging already initialized: {}", err);
        }
    });
}

/// Shorten `s` to at most `max_chars` characters for log and trace output.
///
/// Cuts on a char boundary and marks the cut with `...(truncated)`.
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...(truncated)", &s[..cut]),
    }
}
