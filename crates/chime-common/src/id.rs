//! Process identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// True for the kernel scheduler (0) and init/launchd (1).
    ///
    /// Ancestry walks never step onto these.
    pub fn is_root(self) -> bool {
        self.0 <= 1
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}
