//! Exit codes for the chime CLI.
//!
//! Notification delivery never affects the exit code; only hook management
//! and argument errors do.
//!
//! Exit code ranges:
//! - 0-9: operational outcomes
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors

use crate::hooks::HookError;
use crate::hooks::store::StoreError;

/// Exit codes for chime operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success, including "nothing to do".
    Clean = 0,

    /// Some targets in a multi-target install/uninstall failed.
    PartialFail = 3,

    /// Invalid arguments or unknown target name.
    ArgsError = 10,

    /// A config file could not be written due to permissions.
    PermissionError = 12,

    /// Internal error (bug).
    InternalError = 20,

    /// Any other I/O failure.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Stable name for JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Classify a hook-management failure.
    pub fn for_hook_error(err: &HookError) -> Self {
        match err {
            HookError::UnknownTarget(_) => ExitCode::ArgsError,
            HookError::NoHomeDir => ExitCode::IoError,
            HookError::Io(e) => Self::for_io_kind(e.kind()),
            HookError::Store(StoreError::Io { source, .. })
            | HookError::Store(StoreError::Persist { source, .. }) => {
                Self::for_io_kind(source.kind())
            }
            HookError::Store(StoreError::Serialize(_)) => ExitCode::InternalError,
        }
    }

    fn for_io_kind(kind: std::io::ErrorKind) -> Self {
        if kind == std::io::ErrorKind::PermissionDenied {
            ExitCode::PermissionError
        } else {
            ExitCode::IoError
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
