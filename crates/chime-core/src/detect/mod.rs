//! Calling-agent detection.
//!
//! Walks the ancestry of the chime process and matches each ancestor against
//! the signature table:
//!
//! - [`procargs`]: decoders for raw per-process argument buffers
//! - [`ancestry`]: the lazy, bounded ancestry walk
//! - [`signature`]: the ordered signature table and first-match matcher
//!
//! # Usage
//!
//! ```ignore
//! use chime_core::detect::detect;
//!
//! let agent = detect(false);
//! ```

pub mod ancestry;
pub mod procargs;
pub mod signature;

pub use ancestry::{
    current_parent, walk_ancestors, Ancestors, LiveProcessTable, ProcessRecord, ProcessTable,
    MAX_ANCESTRY_DEPTH,
};
pub use signature::{AgentSignature, Detection, SignatureMatch, SignatureTable};

use crate::logging::truncate_for_log;
use chime_common::{AgentKind, ProcessId};
use std::io::Write;
use tracing::debug;

/// Characters of each ancestor's command line shown in trace output.
pub const TRACE_PREVIEW_LEN: usize = 80;

/// Detect the agent that launched this process using the built-in table.
///
/// When `trace` is set, one line per visited ancestor and one line for the
/// outcome are written to stderr.
pub fn detect(trace: bool) -> AgentKind {
    detect_live(&SignatureTable::builtin(), MAX_ANCESTRY_DEPTH, trace).agent
}

/// Detect against the live process table, starting at this process's parent.
pub fn detect_live(signatures: &SignatureTable, max_depth: u32, trace: bool) -> Detection {
    let Some(start) = current_parent() else {
        debug!("no parent process available, skipping detection");
        return Detection::unknown(0);
    };
    let table = LiveProcessTable::new();

    if trace {
        let stderr = std::io::stderr();
        let mut sink = stderr.lock();
        detect_with(&table, start, signatures, max_depth, Some(&mut sink))
    } else {
        detect_with(&table, start, signatures, max_depth, None)
    }
}

/// Walk from `start` through `table` and return the first signature match.
///
/// Trace lines go to `trace` when provided; write failures are ignored.
pub fn detect_with<T: ProcessTable + ?Sized>(
    table: &T,
    start: ProcessId,
    signatures: &SignatureTable,
    max_depth: u32,
    mut trace: Option<&mut dyn Write>,
) -> Detection {
    let walk = walk_ancestors(table, start, max_depth);

    let detection = signatures.detect_inspecting(walk, |record| {
        let command_line = record.command_line();
        debug!(
            pid = record.pid.0,
            depth = record.depth,
            name = %record.name,
            "inspecting ancestor"
        );
        if let Some(sink) = trace.as_deref_mut() {
            let _ = writeln!(
                sink,
                "[{}] pid={} name={} cmd={}",
                record.depth,
                record.pid,
                record.name,
                truncate_for_log(&command_line, TRACE_PREVIEW_LEN)
            );
        }
    });

    match &detection.matched {
        Some(m) => {
            debug!(
                agent = %detection.agent,
                pattern = m.signature.pattern,
                depth = m.record.depth,
                "agent detected"
            );
            if let Some(sink) = trace.as_deref_mut() {
                let _ = writeln!(
                    sink,
                    "matched '{}' -> {} at depth {} (pid {})",
                    m.signature.pattern, detection.agent, m.record.depth, m.record.pid
                );
            }
        }
        None => {
            debug!(visited = detection.visited, "no agent detected");
            if let Some(sink) = trace.as_deref_mut() {
                let _ = writeln!(
                    sink,
                    "no agent matched after {} ancestors",
                    detection.visited
                );
            }
        }
    }

    detection
}
