//! Desktop notification delivery.
//!
//! Delivery shells out to the platform's notification tool. It is
//! fire-and-forget from the caller's point of view: [`send_best_effort`] logs
//! failures and never propagates them.

pub mod icon;

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed {
        program: &'static str,
        status: ExitStatus,
    },

    #[error("desktop notifications are not supported on this platform")]
    Unsupported,
}

/// A fully resolved notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
    pub icon: Option<PathBuf>,
}

pub trait Notifier {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Platform flavours with a known notification command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Program and arguments that display `n`, or `None` if unsupported.
    pub fn command_for(self, n: &Notification) -> Option<(&'static str, Vec<String>)> {
        match self {
            Platform::MacOs => {
                let mut script = format!(
                    "display notification {} with title {}",
                    applescript_quote(&n.body),
                    applescript_quote(&n.title)
                );
                if let Some(sound) = &n.sound {
                    script.push_str(" sound name ");
                    script.push_str(&applescript_quote(sound));
                }
                Some(("osascript", vec!["-e".to_string(), script]))
            }
            Platform::Linux => {
                let mut args = vec!["--app-name=chime".to_string()];
                if let Some(icon) = &n.icon {
                    args.push(format!("--icon={}", icon.display()));
                }
                if let Some(sound) = &n.sound {
                    args.push(format!("--hint=string:sound-name:{}", sound));
                }
                args.push("--".to_string());
                args.push(n.title.clone());
                args.push(n.body.clone());
                Some(("notify-send", args))
            }
            Platform::Other => None,
        }
    }
}

/// Quote `s` as an AppleScript string literal.
fn applescript_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Delivers through the current platform's notification command.
#[derive(Debug, Clone, Copy)]
pub struct SystemNotifier {
    platform: Platform,
}

impl Default for SystemNotifier {
    fn default() -> Self {
        SystemNotifier {
            platform: Platform::current(),
        }
    }
}

impl SystemNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for SystemNotifier {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (program, args) = self
            .platform
            .command_for(notification)
            .ok_or(NotifyError::Unsupported)?;
        debug!(program, title = %notification.title, "delivering notification");

        let status = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| NotifyError::Spawn { program, source })?;
        if !status.success() {
            return Err(NotifyError::Failed { program, status });
        }
        Ok(())
    }
}

/// Deliver `notification`, logging instead of returning any failure.
///
/// Returns whether delivery succeeded.
pub fn send_best_effort(notifier: &dyn Notifier, notification: &Notification) -> bool {
    match notifier.deliver(notification) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "notification not delivered");
            false
        }
    }
}
