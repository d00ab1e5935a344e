//! Agent kinds recognised by ancestry detection.
//!
//! An [`AgentKind`] is the category a signature match resolves to. It keys the
//! notification preset table and is accepted on the command line via
//! `--preset`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A coding agent that can invoke chime, or `Unknown` when none matched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Claude,
    Codex,
    Gemini,
    Copilot,
    Cursor,
    #[value(name = "opencode")]
    OpenCode,
    Aider,
    Windsurf,
    Unknown,
}

impl AgentKind {
    /// Stable lowercase identifier (config keys, JSON output).
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Codex => "codex",
            AgentKind::Gemini => "gemini",
            AgentKind::Copilot => "copilot",
            AgentKind::Cursor => "cursor",
            AgentKind::OpenCode => "opencode",
            AgentKind::Aider => "aider",
            AgentKind::Windsurf => "windsurf",
            AgentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
