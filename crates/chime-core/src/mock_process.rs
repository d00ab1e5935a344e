//! In-memory process table for testing.
//!
//! Builds synthetic process trees (chains, cycles, vanished parents) so the
//! ancestry walk and detection can be exercised without touching the live
//! process table.
//!
//! # Example
//!
//! ```ignore
//! use chime_core::mock_process::MockProcessTable;
//!
//! let table = MockProcessTable::new()
//!     .with_process(300, 200, "bash", &["bash"])
//!     .with_process(200, 1, "node", &["node", "/usr/local/bin/claude"]);
//! ```

use crate::detect::ancestry::ProcessTable;
use chime_common::ProcessId;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct MockEntry {
    ppid: u32,
    name: String,
    args: Vec<String>,
}

/// A fixed process table keyed by pid.
///
/// Records every pid whose details were read, so tests can assert that a
/// walk stopped early.
#[derive(Debug, Default)]
pub struct MockProcessTable {
    entries: HashMap<u32, MockEntry>,
    inspected: RefCell<Vec<u32>>,
}

impl MockProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a process with an explicit parent.
    pub fn with_process(mut self, pid: u32, ppid: u32, name: &str, args: &[&str]) -> Self {
        self.entries.insert(
            pid,
            MockEntry {
                ppid,
                name: name.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        );
        self
    }

    /// Build a linear chain: each entry's parent is the next entry, and the
    /// last entry's parent is init. Arguments default to the name.
    pub fn chain(links: &[(u32, &str)]) -> Self {
        let mut table = Self::new();
        for (i, &(pid, name)) in links.iter().enumerate() {
            let ppid = links.get(i + 1).map(|(p, _)| *p).unwrap_or(1);
            table = table.with_process(pid, ppid, name, &[name]);
        }
        table
    }

    /// Build a chain from full command lines, splitting arguments on spaces
    /// and using the first word's basename as the process name.
    pub fn chain_from_commands(links: &[(u32, &str)]) -> Self {
        let mut table = Self::new();
        for (i, &(pid, command)) in links.iter().enumerate() {
            let ppid = links.get(i + 1).map(|(p, _)| *p).unwrap_or(1);
            let args: Vec<&str> = command.split_whitespace().collect();
            let name = args
                .first()
                .and_then(|first| first.rsplit('/').next())
                .unwrap_or_default();
            table = table.with_process(pid, ppid, name, &args);
        }
        table
    }

    /// Pids whose name or arguments were read, in order, deduplicated.
    pub fn inspected(&self) -> Vec<u32> {
        self.inspected.borrow().clone()
    }

    fn touch(&self, pid: u32) {
        let mut inspected = self.inspected.borrow_mut();
        if !inspected.contains(&pid) {
            inspected.push(pid);
        }
    }
}

impl ProcessTable for MockProcessTable {
    fn parent_pid(&self, pid: ProcessId) -> Option<ProcessId> {
        self.entries.get(&pid.0).map(|e| ProcessId(e.ppid))
    }

    fn name(&self, pid: ProcessId) -> Option<String> {
        self.touch(pid.0);
        self.entries.get(&pid.0).map(|e| e.name.clone())
    }

    fn args(&self, pid: ProcessId) -> Vec<String> {
        self.touch(pid.0);
        self.entries
            .get(&pid.0)
            .map(|e| e.args.clone())
            .unwrap_or_default()
    }
}
