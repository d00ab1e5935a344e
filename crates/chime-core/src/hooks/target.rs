//! The static table of hook targets.

use std::fmt;
use std::path::{Path, PathBuf};

/// Where a target's config file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Under the user's home directory.
    User,
    /// Under the current repository root.
    Repo,
}

/// Shape of a hook entry in the target's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `{ "hooks": [ { "type", "command", "timeout" } ] }`
    Nested,
    /// `{ "type", "bash", "timeoutSec" }`
    Flat,
}

/// An agent tool whose config file can carry a chime hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub id: &'static str,
    pub display_name: &'static str,
    pub scope: Scope,
    /// Marker directory relative to the scope root; presence means detected.
    pub detect_dir: &'static str,
    /// Config file relative to the scope root.
    pub config_file: &'static str,
    pub event: &'static str,
    pub dialect: Dialect,
    /// Top-level `version` the file must carry, if any.
    pub version: Option<u64>,
    pub message: &'static str,
    pub title: &'static str,
}

pub const CLAUDE: Target = Target {
    id: "claude",
    display_name: "Claude Code",
    scope: Scope::User,
    detect_dir: ".claude",
    config_file: ".claude/settings.json",
    event: "Stop",
    dialect: Dialect::Nested,
    version: None,
    message: "Task complete",
    title: "Claude Code",
};

pub const GEMINI: Target = Target {
    id: "gemini",
    display_name: "Gemini CLI",
    scope: Scope::User,
    detect_dir: ".gemini",
    config_file: ".gemini/settings.json",
    event: "AfterAgent",
    dialect: Dialect::Nested,
    version: None,
    message: "Agent turn complete",
    title: "Gemini CLI",
};

pub const COPILOT: Target = Target {
    id: "copilot",
    display_name: "GitHub Copilot",
    scope: Scope::Repo,
    detect_dir: ".github",
    config_file: ".github/hooks/chime.json",
    event: "sessionEnd",
    dialect: Dialect::Flat,
    version: Some(1),
    message: "Session complete",
    title: "Copilot",
};

/// Every target, in processing order.
pub const TARGETS: &[Target] = &[CLAUDE, GEMINI, COPILOT];

/// Look up a target by id (case-insensitive).
pub fn find_target(id: &str) -> Option<&'static Target> {
    let id = id.trim();
    TARGETS.iter().find(|t| t.id.eq_ignore_ascii_case(id))
}

/// Comma-separated target ids, for error messages.
pub fn target_ids() -> String {
    TARGETS.iter().map(|t| t.id).collect::<Vec<_>>().join(", ")
}

impl Target {
    fn root<'a>(&self, home: &'a Path, repo_root: &'a Path) -> &'a Path {
        match self.scope {
            Scope::User => home,
            Scope::Repo => repo_root,
        }
    }

    pub fn config_path(&self, home: &Path, repo_root: &Path) -> PathBuf {
        self.root(home, repo_root).join(self.config_file)
    }

    pub fn detect_path(&self, home: &Path, repo_root: &Path) -> PathBuf {
        self.root(home, repo_root).join(self.detect_dir)
    }

    pub fn is_repo_scoped(&self) -> bool {
        self.scope == Scope::Repo
    }

    /// The command string embedded in this target's hook entry.
    pub fn command(&self, marker: &str) -> String {
        match self.dialect {
            Dialect::Nested => format!("{} \"{}\" -t \"{}\"", marker, self.message, self.title),
            Dialect::Flat => format!("{} '{}' -t '{}'", marker, self.message, self.title),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}
