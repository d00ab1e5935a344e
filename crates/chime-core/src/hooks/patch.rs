//! Dialect-aware edits of hook entries inside a JSON document.
//!
//! Writing uses the target's own dialect. Reading and removal check both
//! dialects, so an entry written by hand in the other shape is still found.
//! An entry belongs to chime when one of its command strings contains the
//! marker substring.

use super::target::{Dialect, Target};
use serde_json::{json, Map, Value};

/// Timeout for nested-dialect entries, in milliseconds.
pub const NESTED_TIMEOUT_MS: u64 = 5000;
/// Timeout for flat-dialect entries, in seconds.
pub const FLAT_TIMEOUT_SEC: u64 = 5;

/// A hook entry in one of the two supported shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEntry {
    Nested { command: String, timeout_ms: u64 },
    Flat { bash: String, timeout_sec: u64 },
}

impl HookEntry {
    /// The entry chime installs into `target`.
    pub fn for_target(target: &Target, marker: &str) -> Self {
        let command = target.command(marker);
        match target.dialect {
            Dialect::Nested => HookEntry::Nested {
                command,
                timeout_ms: NESTED_TIMEOUT_MS,
            },
            Dialect::Flat => HookEntry::Flat {
                bash: command,
                timeout_sec: FLAT_TIMEOUT_SEC,
            },
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            HookEntry::Nested {
                command,
                timeout_ms,
            } => json!({
                "hooks": [
                    { "type": "command", "command": command, "timeout": timeout_ms }
                ]
            }),
            HookEntry::Flat { bash, timeout_sec } => json!({
                "type": "command",
                "bash": bash,
                "timeoutSec": timeout_sec,
            }),
        }
    }
}

/// Result of [`remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveOutcome {
    /// Number of chime commands dropped from the event array.
    pub removed: usize,
    /// The `hooks` mapping is empty or absent after the removal.
    pub hooks_empty: bool,
}

fn has_marker(value: Option<&Value>, marker: &str) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.contains(marker))
}

/// Whether a single event-array entry was installed by chime, in either dialect.
pub fn entry_matches(entry: &Value, marker: &str) -> bool {
    let nested = entry
        .get("hooks")
        .and_then(Value::as_array)
        .is_some_and(|inner| inner.iter().any(|h| has_marker(h.get("command"), marker)));
    nested || has_marker(entry.get("command"), marker) || has_marker(entry.get("bash"), marker)
}

fn event_entries<'a>(doc: &'a Value, target: &Target) -> Option<&'a Vec<Value>> {
    doc.get("hooks")?.get(target.event)?.as_array()
}

/// Whether `doc` already carries a chime entry for `target`'s event.
pub fn contains(doc: &Value, target: &Target, marker: &str) -> bool {
    event_entries(doc, target).is_some_and(|entries| entries.iter().any(|e| entry_matches(e, marker)))
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

fn ensure_array(value: &mut Value) -> &mut Vec<Value> {
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("value was just replaced with an array"),
    }
}

/// Append chime's entry for `target`. Returns `false` if one is already present.
///
/// Wrong-typed containers on the path (`root`, `hooks`, the event value) are
/// replaced with empty ones; everything else in the document is kept.
pub fn insert(doc: &mut Value, target: &Target, marker: &str) -> bool {
    if contains(doc, target, marker) {
        return false;
    }

    let root = ensure_object(doc);
    if let Some(version) = target.version {
        root.entry("version").or_insert_with(|| Value::from(version));
    }
    let hooks = ensure_object(
        root.entry("hooks")
            .or_insert_with(|| Value::Object(Map::new())),
    );
    let entries = ensure_array(
        hooks
            .entry(target.event)
            .or_insert_with(|| Value::Array(Vec::new())),
    );
    entries.push(HookEntry::for_target(target, marker).to_value());
    true
}

/// Drop every chime command from `target`'s event array.
///
/// Flat entries are dropped whole. In nested entries only the matching inner
/// commands go; the wrapper is dropped once its inner list is empty. An event
/// array emptied by the removal is deleted from `hooks`.
pub fn remove(doc: &mut Value, target: &Target, marker: &str) -> RemoveOutcome {
    let hooks = match doc.get_mut("hooks") {
        Some(Value::Object(hooks)) => hooks,
        Some(_) => return RemoveOutcome::default(),
        None => {
            return RemoveOutcome {
                removed: 0,
                hooks_empty: true,
            }
        }
    };

    let mut removed = 0;
    if let Some(Value::Array(entries)) = hooks.get_mut(target.event) {
        entries.retain_mut(|entry| {
            if has_marker(entry.get("command"), marker) || has_marker(entry.get("bash"), marker) {
                removed += 1;
                return false;
            }
            if let Some(Value::Array(inner)) = entry.get_mut("hooks") {
                let before = inner.len();
                inner.retain(|hook| !has_marker(hook.get("command"), marker));
                let dropped = before - inner.len();
                removed += dropped;
                if dropped > 0 && inner.is_empty() {
                    return false;
                }
            }
            true
        });
        if removed > 0 && entries.is_empty() {
            hooks.remove(target.event);
        }
    }

    RemoveOutcome {
        removed,
        hooks_empty: hooks.is_empty(),
    }
}
