//! User configuration for chime.
//!
//! Resolution order (highest to lowest priority):
//! 1. `CHIME_CONFIG` (path to a TOML file)
//! 2. `$XDG_CONFIG_HOME/chime/config.toml`
//! 3. `~/.config/chime/config.toml`
//! 4. Built-in defaults
//!
//! A missing file is not an error. A malformed file is, but callers on the
//! notification path use [`load_or_default`] which downgrades it to a warning.

pub mod preset;

pub use preset::{Preset, PresetOverride};

use crate::detect::MAX_ANCESTRY_DEPTH;
use chime_common::AgentKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Config directory name under the XDG config home.
const CONFIG_DIR_NAME: &str = "chime";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChimeConfig {
    /// Ancestry walk bound.
    pub max_depth: u32,
    /// Sound applied to every preset before per-agent overrides.
    pub sound: Option<String>,
    /// Never play a sound.
    pub silent: bool,
    pub presets: BTreeMap<AgentKind, PresetOverride>,
}

impl Default for ChimeConfig {
    fn default() -> Self {
        ChimeConfig {
            max_depth: MAX_ANCESTRY_DEPTH,
            sound: None,
            silent: false,
            presets: BTreeMap::new(),
        }
    }
}

/// A config together with the file it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ChimeConfig,
    /// `None` when defaults were used.
    pub path: Option<PathBuf>,
}

impl ChimeConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the preset for `agent`.
    ///
    /// Layers: built-in, global `sound`, `[presets.<agent>]`, `silent`, then
    /// the command-line override.
    pub fn preset_for(&self, agent: AgentKind, cli: &PresetOverride) -> Preset {
        let mut preset = preset::builtin(agent);
        if let Some(sound) = &self.sound {
            preset.sound = Some(sound.clone());
        }
        if let Some(over) = self.presets.get(&agent) {
            preset = preset.merged(over);
        }
        if self.silent {
            preset = preset.silenced();
        }
        preset.merged(cli)
    }
}

/// Candidate config file path, without checking that it exists.
pub fn resolve_config_path() -> Option<PathBuf> {
    resolve_config_path_with(|key| std::env::var_os(key).map(PathBuf::from), dirs::home_dir())
}

/// Like [`resolve_config_path`], with injected environment and home dir.
pub fn resolve_config_path_with<F>(lookup: F, home: Option<PathBuf>) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    if let Some(path) = lookup("CHIME_CONFIG").filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    let config_home = lookup("XDG_CONFIG_HOME")
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|h| h.join(".config")))?;
    Some(config_home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(LoadedConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = ChimeConfig::from_toml_str(&content, path)?;
    debug!(path = %path.display(), "loaded config");
    Ok(LoadedConfig {
        config,
        path: Some(path.to_path_buf()),
    })
}

/// Load the config from the standard location.
pub fn load_config() -> Result<LoadedConfig, ConfigError> {
    match resolve_config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(LoadedConfig::default()),
    }
}

/// Load the config, falling back to defaults with a warning on error.
pub fn load_or_default() -> LoadedConfig {
    load_config().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unusable config file");
        LoadedConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<PathBuf> {
        let map: HashMap<String, PathBuf> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PathBuf::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_env_path_wins() {
        let path = resolve_config_path_with(
            env(&[("CHIME_CONFIG", "/tmp/c.toml"), ("XDG_CONFIG_HOME", "/xdg")]),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(path, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn xdg_then_home() {
        let path = resolve_config_path_with(
            env(&[("XDG_CONFIG_HOME", "/xdg")]),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(path, Some(PathBuf::from("/xdg/chime/config.toml")));

        let path = resolve_config_path_with(env(&[]), Some(PathBuf::from("/home/u")));
        assert_eq!(path, Some(PathBuf::from("/home/u/.config/chime/config.toml")));

        assert_eq!(resolve_config_path_with(env(&[]), None), None);
    }

    #[test]
    fn relative_xdg_is_ignored() {
        let path = resolve_config_path_with(
            env(&[("XDG_CONFIG_HOME", "relative")]),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(path, Some(PathBuf::from("/home/u/.config/chime/config.toml")));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.config, ChimeConfig::default());
        assert!(loaded.path.is_none());
    }

    #[test]
    fn parses_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
max_depth = 8
sound = "Glass"

[presets.claude]
title = "Claude"
sound = "Hero"
"#,
        )
        .unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.max_depth, 8);
        let over = &loaded.config.presets[&AgentKind::Claude];
        assert_eq!(over.title.as_deref(), Some("Claude"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_depth = \"deep\"").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn preset_layering() {
        let mut config = ChimeConfig {
            sound: Some("Basso".into()),
            ..Default::default()
        };
        config.presets.insert(
            AgentKind::Gemini,
            PresetOverride {
                sound: Some("Hero".into()),
                ..Default::default()
            },
        );

        let codex = config.preset_for(AgentKind::Codex, &PresetOverride::default());
        assert_eq!(codex.sound.as_deref(), Some("Basso"));

        let gemini = config.preset_for(AgentKind::Gemini, &PresetOverride::default());
        assert_eq!(gemini.sound.as_deref(), Some("Hero"));
        assert_eq!(gemini.title, "Gemini CLI");

        let cli = PresetOverride {
            title: Some("Build".into()),
            ..Default::default()
        };
        assert_eq!(config.preset_for(AgentKind::Gemini, &cli).title, "Build");
    }

    #[test]
    fn silent_mutes_unless_cli_sound_given() {
        let config = ChimeConfig {
            silent: true,
            ..Default::default()
        };
        assert!(config
            .preset_for(AgentKind::Claude, &PresetOverride::default())
            .sound
            .is_none());
        let cli = PresetOverride {
            sound: Some("Tink".into()),
            ..Default::default()
        };
        assert_eq!(
            config.preset_for(AgentKind::Claude, &cli).sound.as_deref(),
            Some("Tink")
        );
    }
}
