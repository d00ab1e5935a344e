//! Hook installation into agent tool config files.
//!
//! - [`target`]: the static table of supported tools
//! - [`store`]: tolerant reads, atomic writes, `.bak` backups
//! - [`patch`]: dialect-aware insert/contains/remove on a JSON document
//!
//! [`Installer`] ties them together per target and across all targets.

pub mod patch;
pub mod store;
pub mod target;

pub use patch::{HookEntry, RemoveOutcome};
pub use store::StoreError;
pub use target::{find_target, Dialect, Scope, Target, TARGETS};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Substring identifying chime's own hook entries.
pub const DEFAULT_MARKER: &str = "chime";

#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown target '{0}' (expected one of: {ids})", ids = target::target_ids())]
    UnknownTarget(String),

    #[error("cannot determine the home directory")]
    NoHomeDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Roots and marker used to locate and recognise hook entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    pub home: PathBuf,
    /// Root for repo-scoped targets.
    pub repo_root: PathBuf,
    pub marker: String,
}

impl InstallContext {
    pub fn new(home: impl Into<PathBuf>, repo_root: impl Into<PathBuf>) -> Self {
        InstallContext {
            home: home.into(),
            repo_root: repo_root.into(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    /// Home directory of the current user and the repository enclosing the
    /// current working directory.
    pub fn from_env() -> Result<Self, HookError> {
        let home = dirs::home_dir().ok_or(HookError::NoHomeDir)?;
        let repo_root = find_repo_root(&std::env::current_dir()?);
        Ok(Self::new(home, repo_root))
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

/// Nearest directory at or above `start` holding a `.git` entry, or `start`
/// itself outside a repository.
pub fn find_repo_root(start: &Path) -> PathBuf {
    match start.ancestors().find(|dir| dir.join(".git").exists()) {
        Some(root) => root.to_path_buf(),
        None => {
            debug!(cwd = %start.display(), "no enclosing git repository, using cwd");
            start.to_path_buf()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UninstallOutcome {
    NotInstalled,
    /// Entries removed and the file rewritten.
    Removed,
    /// Entries removed and the now-empty repo-scoped file deleted.
    Deleted,
}

/// Per-target result of a multi-target operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReportStatus {
    Installed,
    AlreadyInstalled,
    Removed,
    Deleted,
    NotInstalled,
    Failed { error: String },
}

impl From<InstallOutcome> for ReportStatus {
    fn from(outcome: InstallOutcome) -> Self {
        match outcome {
            InstallOutcome::Installed => ReportStatus::Installed,
            InstallOutcome::AlreadyInstalled => ReportStatus::AlreadyInstalled,
        }
    }
}

impl From<UninstallOutcome> for ReportStatus {
    fn from(outcome: UninstallOutcome) -> Self {
        match outcome {
            UninstallOutcome::NotInstalled => ReportStatus::NotInstalled,
            UninstallOutcome::Removed => ReportStatus::Removed,
            UninstallOutcome::Deleted => ReportStatus::Deleted,
        }
    }
}

impl ReportStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReportStatus::Failed { .. })
    }

    /// Short human label.
    pub fn label(&self) -> &str {
        match self {
            ReportStatus::Installed => "installed",
            ReportStatus::AlreadyInstalled => "already installed",
            ReportStatus::Removed => "removed",
            ReportStatus::Deleted => "removed (file deleted)",
            ReportStatus::NotInstalled => "not installed",
            ReportStatus::Failed { error } => error,
        }
    }
}

fn serialize_target_id<S: Serializer>(target: &&'static Target, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(target.id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    #[serde(serialize_with = "serialize_target_id")]
    pub target: &'static Target,
    pub config_path: PathBuf,
    #[serde(flatten)]
    pub status: ReportStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetStatus {
    #[serde(serialize_with = "serialize_target_id")]
    pub target: &'static Target,
    pub detected: bool,
    pub installed: bool,
    pub config_path: PathBuf,
}

/// Installs and removes chime hook entries for the supported targets.
#[derive(Debug, Clone)]
pub struct Installer {
    ctx: InstallContext,
}

impl Installer {
    pub fn new(ctx: InstallContext) -> Self {
        Installer { ctx }
    }

    pub fn context(&self) -> &InstallContext {
        &self.ctx
    }

    pub fn config_path(&self, target: &Target) -> PathBuf {
        target.config_path(&self.ctx.home, &self.ctx.repo_root)
    }

    /// The tool's config location exists on this machine.
    pub fn is_detected(&self, target: &Target) -> bool {
        target
            .detect_path(&self.ctx.home, &self.ctx.repo_root)
            .is_dir()
    }

    /// The tool's config currently carries a chime entry.
    pub fn is_installed(&self, target: &Target) -> bool {
        store::read_document(&self.config_path(target))
            .is_some_and(|doc| patch::contains(&doc, target, &self.ctx.marker))
    }

    pub fn install(&self, target: &Target) -> Result<InstallOutcome, HookError> {
        let path = self.config_path(target);
        let mut doc = store::read_document(&path).unwrap_or_else(|| Value::Object(Map::new()));

        if patch::contains(&doc, target, &self.ctx.marker) {
            debug!(target = target.id, path = %path.display(), "hook already present");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        if path.exists() {
            store::backup(&path);
        }
        patch::insert(&mut doc, target, &self.ctx.marker);
        store::write_document(&doc, &path)?;

        info!(target = target.id, path = %path.display(), "installed hook");
        Ok(InstallOutcome::Installed)
    }

    /// Install into the target named `name`.
    pub fn install_named(&self, name: &str) -> Result<(&'static Target, InstallOutcome), HookError> {
        let target = find_target(name).ok_or_else(|| HookError::UnknownTarget(name.to_string()))?;
        let outcome = self.install(target)?;
        Ok((target, outcome))
    }

    pub fn uninstall(&self, target: &Target) -> Result<UninstallOutcome, HookError> {
        let path = self.config_path(target);
        let Some(mut doc) = store::read_document(&path) else {
            debug!(target = target.id, path = %path.display(), "no readable config, nothing to remove");
            return Ok(UninstallOutcome::NotInstalled);
        };
        if !patch::contains(&doc, target, &self.ctx.marker) {
            return Ok(UninstallOutcome::NotInstalled);
        }

        store::backup(&path);
        let outcome = patch::remove(&mut doc, target, &self.ctx.marker);
        debug!(
            target = target.id,
            removed = outcome.removed,
            hooks_empty = outcome.hooks_empty,
            "removed hook entries"
        );

        if target.is_repo_scoped() && outcome.hooks_empty {
            store::delete_document(&path)?;
            info!(target = target.id, path = %path.display(), "removed hook and deleted config");
            Ok(UninstallOutcome::Deleted)
        } else {
            store::write_document(&doc, &path)?;
            info!(target = target.id, path = %path.display(), "removed hook");
            Ok(UninstallOutcome::Removed)
        }
    }

    fn report<O: Into<ReportStatus>>(
        &self,
        target: &'static Target,
        result: Result<O, HookError>,
    ) -> TargetReport {
        let status = match result {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                warn!(target = target.id, error = %err, "hook operation failed");
                ReportStatus::Failed {
                    error: err.to_string(),
                }
            }
        };
        TargetReport {
            target,
            config_path: self.config_path(target),
            status,
        }
    }

    /// Install into every detected target. Undetected targets are skipped.
    pub fn install_all(&self) -> Vec<TargetReport> {
        TARGETS
            .iter()
            .filter(|t| {
                let detected = self.is_detected(t);
                if !detected {
                    debug!(target = t.id, "not detected, skipping");
                }
                detected
            })
            .map(|t| self.report(t, self.install(t)))
            .collect()
    }

    /// Uninstall from every target that currently carries the hook.
    pub fn uninstall_all(&self) -> Vec<TargetReport> {
        TARGETS
            .iter()
            .filter(|t| self.is_installed(t))
            .map(|t| self.report(t, self.uninstall(t)))
            .collect()
    }

    pub fn status(&self) -> Vec<TargetStatus> {
        TARGETS
            .iter()
            .map(|t| TargetStatus {
                target: t,
                detected: self.is_detected(t),
                installed: self.is_installed(t),
                config_path: self.config_path(t),
            })
            .collect()
    }
}
