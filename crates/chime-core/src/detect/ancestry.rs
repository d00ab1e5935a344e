//! Process ancestry walking.
//!
//! The walk starts at the process that launched chime and follows parent
//! links upward through a [`ProcessTable`]. It is exposed as a lazy iterator
//! so detection can stop at the first ancestor that matches a signature.

use super::procargs;
use chime_common::ProcessId;
use std::collections::HashSet;
use std::iter::FusedIterator;
use thiserror::Error;
use tracing::trace;

/// Maximum depth to walk up the process tree.
pub const MAX_ANCESTRY_DEPTH: u32 = 20;

/// Errors from reading a single process entry.
///
/// These never escape the walk; a failed lookup simply ends it.
#[derive(Debug, Error)]
pub enum AncestryError {
    #[error("I/O error reading process {pid}: {source}")]
    IoError {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error for process {pid}: {message}")]
    ParseError { pid: u32, message: String },

    #[error("Process {0} not found")]
    ProcessNotFound(u32),
}

/// Read-only view of the process table.
pub trait ProcessTable {
    /// Parent of `pid`, or `None` if the process is gone or unreadable.
    fn parent_pid(&self, pid: ProcessId) -> Option<ProcessId>;

    /// Short process name (comm).
    fn name(&self, pid: ProcessId) -> Option<String>;

    /// Recorded argument vector; empty when unavailable.
    fn args(&self, pid: ProcessId) -> Vec<String>;
}

/// One step of an ancestry walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: ProcessId,
    /// Distance from the walk's starting process (which is depth 0).
    pub depth: u32,
    pub name: String,
    pub args: Vec<String>,
}

impl ProcessRecord {
    /// Arguments joined with single spaces.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Lazy iterator over the ancestors of a process.
///
/// Each call to `next` checks the depth bound and whether the current pid is
/// init or the scheduler, then resolves the parent. A process whose parent
/// cannot be resolved is gone, so the walk ends without yielding it. A parent
/// that equals the current pid, that is init, or that was already visited
/// ends the walk after the current record.
pub struct Ancestors<'a, T: ProcessTable + ?Sized> {
    table: &'a T,
    next: Option<ProcessId>,
    depth: u32,
    max_depth: u32,
    visited: HashSet<ProcessId>,
}

impl<'a, T: ProcessTable + ?Sized> Iterator for Ancestors<'a, T> {
    type Item = ProcessRecord;

    fn next(&mut self) -> Option<ProcessRecord> {
        let pid = self.next.take()?;

        if self.depth >= self.max_depth {
            trace!(pid = pid.0, depth = self.depth, "ancestry depth limit reached");
            return None;
        }
        if pid.is_root() {
            return None;
        }

        let Some(ppid) = self.table.parent_pid(pid) else {
            trace!(pid = pid.0, "process lookup failed, ending walk");
            return None;
        };

        self.visited.insert(pid);
        let record = ProcessRecord {
            pid,
            depth: self.depth,
            name: self.table.name(pid).unwrap_or_default(),
            args: self.table.args(pid),
        };

        self.next = if ppid != pid && !ppid.is_root() && !self.visited.contains(&ppid) {
            Some(ppid)
        } else {
            trace!(pid = pid.0, ppid = ppid.0, "ancestry walk reached root or loop");
            None
        };
        self.depth += 1;

        Some(record)
    }
}

impl<'a, T: ProcessTable + ?Sized> FusedIterator for Ancestors<'a, T> {}

/// Walk upward from `start`, yielding at most `max_depth` records.
pub fn walk_ancestors<T: ProcessTable + ?Sized>(
    table: &T,
    start: ProcessId,
    max_depth: u32,
) -> Ancestors<'_, T> {
    Ancestors {
        table,
        next: Some(start),
        depth: 0,
        max_depth,
        visited: HashSet::new(),
    }
}

/// Parent of the current process.
#[cfg(unix)]
pub fn current_parent() -> Option<ProcessId> {
    Some(ProcessId(std::os::unix::process::parent_id()))
}

#[cfg(not(unix))]
pub fn current_parent() -> Option<ProcessId> {
    None
}

/// The live process table of the running system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveProcessTable;

impl LiveProcessTable {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTable for LiveProcessTable {
    fn parent_pid(&self, pid: ProcessId) -> Option<ProcessId> {
        match platform::read_parent(pid.0) {
            Ok(ppid) => Some(ProcessId(ppid)),
            Err(e) => {
                trace!(error = %e, "parent lookup failed");
                None
            }
        }
    }

    fn name(&self, pid: ProcessId) -> Option<String> {
        platform::read_name(pid.0).ok()
    }

    fn args(&self, pid: ProcessId) -> Vec<String> {
        platform::read_args(pid.0).unwrap_or_default()
    }
}

/// Parse /proc/<pid>/stat content to extract PPID and comm.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_stat(content: &str, pid: u32) -> Result<(u32, String), AncestryError> {
    // Format: pid (comm) state ppid ...
    // The comm can contain spaces and parentheses, so find the last ')' first
    let open_paren = content.find('(').ok_or_else(|| AncestryError::ParseError {
        pid,
        message: "missing '(' in stat".to_string(),
    })?;

    let close_paren = content
        .rfind(')')
        .filter(|close| *close > open_paren)
        .ok_or_else(|| AncestryError::ParseError {
            pid,
            message: "missing ')' in stat".to_string(),
        })?;

    let comm = content[open_paren + 1..close_paren].to_string();

    let rest = content.get(close_paren + 1..).unwrap_or_default();
    let fields: Vec<&str> = rest.split_whitespace().collect();

    // Field 0 after comm is state, field 1 is ppid
    let ppid_field = fields.get(1).ok_or_else(|| AncestryError::ParseError {
        pid,
        message: "too few fields after comm".to_string(),
    })?;

    let ppid = ppid_field
        .parse::<u32>()
        .map_err(|_| AncestryError::ParseError {
            pid,
            message: format!("invalid ppid: {}", ppid_field),
        })?;

    Ok((ppid, comm))
}

#[cfg(target_os = "linux")]
mod platform {
    use super::{parse_stat, procargs, AncestryError};
    use std::fs;

    fn read_stat(pid: u32) -> Result<(u32, String), AncestryError> {
        let content = fs::read_to_string(format!("/proc/{}/stat", pid)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AncestryError::ProcessNotFound(pid)
            } else {
                AncestryError::IoError { pid, source: e }
            }
        })?;
        parse_stat(&content, pid)
    }

    pub(super) fn read_parent(pid: u32) -> Result<u32, AncestryError> {
        read_stat(pid).map(|(ppid, _)| ppid)
    }

    pub(super) fn read_name(pid: u32) -> Result<String, AncestryError> {
        read_stat(pid).map(|(_, comm)| comm)
    }

    pub(super) fn read_args(pid: u32) -> Result<Vec<String>, AncestryError> {
        let raw = fs::read(format!("/proc/{}/cmdline", pid))
            .map_err(|e| AncestryError::IoError { pid, source: e })?;
        Ok(procargs::split_nul_args(&raw))
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::{procargs, AncestryError};
    use std::mem;

    fn bsd_info(pid: u32) -> Result<libc::proc_bsdinfo, AncestryError> {
        // SAFETY: proc_bsdinfo is plain old data; all-zero is a valid value.
        let mut info: libc::proc_bsdinfo = unsafe { mem::zeroed() };
        let size = mem::size_of::<libc::proc_bsdinfo>() as libc::c_int;
        // SAFETY: `info` is a valid, writable proc_bsdinfo of `size` bytes.
        let written = unsafe {
            libc::proc_pidinfo(
                pid as libc::c_int,
                libc::PROC_PIDTBSDINFO,
                0,
                &mut info as *mut _ as *mut libc::c_void,
                size,
            )
        };
        if written != size {
            return Err(AncestryError::ProcessNotFound(pid));
        }
        Ok(info)
    }

    fn c_chars_to_string(chars: &[libc::c_char]) -> String {
        let bytes: Vec<u8> = chars
            .iter()
            .take_while(|c| **c != 0)
            .map(|c| *c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub(super) fn read_parent(pid: u32) -> Result<u32, AncestryError> {
        bsd_info(pid).map(|info| info.pbi_ppid)
    }

    pub(super) fn read_name(pid: u32) -> Result<String, AncestryError> {
        let info = bsd_info(pid)?;
        let name = c_chars_to_string(&info.pbi_name);
        if name.is_empty() {
            Ok(c_chars_to_string(&info.pbi_comm))
        } else {
            Ok(name)
        }
    }

    fn arg_max() -> usize {
        let mut mib = [libc::CTL_KERN, libc::KERN_ARGMAX];
        let mut value: libc::c_int = 0;
        let mut len = mem::size_of::<libc::c_int>();
        // SAFETY: `value` is a writable c_int and `len` holds its size.
        let rc = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                &mut value as *mut _ as *mut libc::c_void,
                &mut len,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc == 0 && value > 0 {
            value as usize
        } else {
            256 * 1024
        }
    }

    pub(super) fn read_args(pid: u32) -> Result<Vec<String>, AncestryError> {
        let mut mib = [libc::CTL_KERN, libc::KERN_PROCARGS2, pid as libc::c_int];
        let mut buf = vec![0u8; arg_max()];
        let mut len = buf.len();
        // SAFETY: `buf` is writable for `len` bytes; the kernel updates `len`
        // to the number of bytes actually written.
        let rc = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                buf.as_mut_ptr() as *mut libc::c_void,
                &mut len,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc != 0 {
            return Err(AncestryError::IoError {
                pid,
                source: std::io::Error::last_os_error(),
            });
        }
        buf.truncate(len.min(buf.len()));
        Ok(procargs::decode_procargs(&buf).args)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod platform {
    use super::AncestryError;

    pub(super) fn read_parent(pid: u32) -> Result<u32, AncestryError> {
        Err(AncestryError::ProcessNotFound(pid))
    }

    pub(super) fn read_name(pid: u32) -> Result<String, AncestryError> {
        Err(AncestryError::ProcessNotFound(pid))
    }

    pub(super) fn read_args(_pid: u32) -> Result<Vec<String>, AncestryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_process::MockProcessTable;

    #[test]
    fn test_parse_stat_simple() {
        let content = "1234 (bash) S 1000 1234 1234 0 -1";
        let (ppid, comm) = parse_stat(content, 1234).unwrap();
        assert_eq!(ppid, 1000);
        assert_eq!(comm, "bash");
    }

    #[test]
    fn test_parse_stat_with_parens_in_comm() {
        let content = "5678 (my (weird) process) S 1234 5678 5678 0 -1";
        let (ppid, comm) = parse_stat(content, 5678).unwrap();
        assert_eq!(ppid, 1234);
        assert_eq!(comm, "my (weird) process");
    }

    #[test]
    fn test_parse_stat_truncated() {
        assert!(parse_stat("42 (node) S", 42).is_err());
        assert!(parse_stat("42 node S 1", 42).is_err());
        assert!(parse_stat("42 )node( S 1", 42).is_err());
        assert!(parse_stat("42 (node) S abc", 42).is_err());
    }

    #[test]
    fn walk_follows_chain_to_root() {
        let table = MockProcessTable::chain(&[(500, "bash"), (400, "node"), (300, "tmux")]);
        let pids: Vec<u32> = walk_ancestors(&table, ProcessId(500), MAX_ANCESTRY_DEPTH)
            .map(|r| r.pid.0)
            .collect();
        assert_eq!(pids, vec![500, 400, 300]);
    }

    #[test]
    fn walk_records_depth_and_args() {
        let table = MockProcessTable::new()
            .with_process(10, 9, "zsh", &["-zsh"])
            .with_process(9, 1, "node", &["node", "/opt/bin/codex"]);
        let records: Vec<_> = walk_ancestors(&table, ProcessId(10), 5).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].depth, 1);
        assert_eq!(records[1].command_line(), "node /opt/bin/codex");
    }

    #[test]
    fn walk_respects_depth_limit() {
        let chain: Vec<(u32, &str)> = (0..50).map(|i| (1000 - i, "sh")).collect();
        let table = MockProcessTable::chain(&chain);
        assert_eq!(walk_ancestors(&table, ProcessId(1000), 20).count(), 20);
        assert_eq!(walk_ancestors(&table, ProcessId(1000), 0).count(), 0);
    }

    #[test]
    fn walk_never_starts_at_init() {
        let table = MockProcessTable::new().with_process(1, 0, "launchd", &[]);
        assert_eq!(walk_ancestors(&table, ProcessId(1), 20).count(), 0);
        assert_eq!(walk_ancestors(&table, ProcessId(0), 20).count(), 0);
    }

    #[test]
    fn walk_stops_on_self_parent() {
        let table = MockProcessTable::new().with_process(77, 77, "weird", &[]);
        assert_eq!(walk_ancestors(&table, ProcessId(77), 20).count(), 1);
    }

    #[test]
    fn walk_stops_on_cycle() {
        let table = MockProcessTable::new()
            .with_process(10, 11, "a", &[])
            .with_process(11, 12, "b", &[])
            .with_process(12, 10, "c", &[]);
        let pids: Vec<u32> = walk_ancestors(&table, ProcessId(10), 100)
            .map(|r| r.pid.0)
            .collect();
        assert_eq!(pids, vec![10, 11, 12]);
    }

    #[test]
    fn walk_stops_when_parent_vanishes() {
        // 20's parent (21) is not in the table.
        let table = MockProcessTable::new().with_process(20, 21, "bash", &[]);
        let mut walk = walk_ancestors(&table, ProcessId(20), 20);
        assert_eq!(walk.next().map(|r| r.pid.0), Some(20));
        assert!(walk.next().is_none());
        assert!(walk.next().is_none());
    }

    #[test]
    fn unknown_start_yields_nothing() {
        let table = MockProcessTable::new();
        assert_eq!(walk_ancestors(&table, ProcessId(999), 20).count(), 0);
        assert!(table.inspected().is_empty());
    }

    #[test]
    fn vanished_parent_is_never_read() {
        let table = MockProcessTable::new().with_process(20, 21, "bash", &["bash"]);
        let records: Vec<_> = walk_ancestors(&table, ProcessId(20), 20).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "bash");
        assert_eq!(table.inspected(), vec![20]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_table_reads_current_process() {
        let table = LiveProcessTable::new();
        let me = ProcessId(std::process::id());
        assert!(table.name(me).is_some_and(|n| !n.is_empty()));
        assert!(!table.args(me).is_empty());
        assert_eq!(table.parent_pid(me), current_parent());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_walk_from_parent_terminates() {
        let table = LiveProcessTable::new();
        if let Some(parent) = current_parent() {
            assert!(walk_ancestors(&table, parent, MAX_ANCESTRY_DEPTH).count() <= 20);
        }
    }
}
