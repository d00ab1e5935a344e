//! Notification presets per agent.
//!
//! Each [`AgentKind`] has a built-in preset. The config file can override any
//! field per agent, and `--title` / `--sound` override the result.

use chime_common::AgentKind;
use serde::{Deserialize, Serialize};

/// A fully resolved notification preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub title: String,
    /// Sound name (macOS system sound). `None` means silent.
    pub sound: Option<String>,
    /// Icon file name or absolute path, resolved by `notify::icon`.
    pub icon: Option<String>,
}

/// Partial preset from the config file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetOverride {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Built-in preset for `agent`.
pub fn builtin(agent: AgentKind) -> Preset {
    let (title, sound, icon) = match agent {
        AgentKind::Claude => ("Claude Code", "Glass", Some("claude.png")),
        AgentKind::Codex => ("Codex", "Hero", Some("codex.png")),
        AgentKind::Gemini => ("Gemini CLI", "Submarine", Some("gemini.png")),
        AgentKind::Copilot => ("GitHub Copilot", "Pop", Some("copilot.png")),
        AgentKind::Cursor => ("Cursor", "Tink", Some("cursor.png")),
        AgentKind::OpenCode => ("OpenCode", "Purr", Some("opencode.png")),
        AgentKind::Aider => ("Aider", "Funk", Some("aider.png")),
        AgentKind::Windsurf => ("Windsurf", "Blow", Some("windsurf.png")),
        AgentKind::Unknown => ("Agent", "Ping", None),
    };
    Preset {
        title: title.to_string(),
        sound: Some(sound.to_string()),
        icon: icon.map(str::to_string),
    }
}

impl Preset {
    /// Apply the set fields of `over` on top of `self`.
    pub fn merged(mut self, over: &PresetOverride) -> Self {
        if let Some(title) = &over.title {
            self.title = title.clone();
        }
        if let Some(sound) = &over.sound {
            self.sound = Some(sound.clone());
        }
        if let Some(icon) = &over.icon {
            self.icon = Some(icon.clone());
        }
        self
    }

    pub fn silenced(mut self) -> Self {
        self.sound = None;
        self
    }
}
