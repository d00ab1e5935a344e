//! Agent signature table and matcher.
//!
//! A signature is a lowercase substring tested against an ancestor's process
//! name and its assembled command line. The table is ordered and the first
//! hit wins, so patterns that commonly appear inside other agents' command
//! lines (model names such as `claude-sonnet` or `gpt-5-codex`) are listed
//! last.

use super::ancestry::ProcessRecord;
use chime_common::AgentKind;
use serde::Serialize;

/// A substring pattern and the agent it identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentSignature {
    pub pattern: &'static str,
    pub agent: AgentKind,
}

impl AgentSignature {
    pub const fn new(pattern: &'static str, agent: AgentKind) -> Self {
        Self { pattern, agent }
    }
}

/// Built-in signatures, in match order.
pub const BUILTIN_SIGNATURES: &[AgentSignature] = &[
    AgentSignature::new("copilot", AgentKind::Copilot),
    AgentSignature::new("cursor-agent", AgentKind::Cursor),
    AgentSignature::new("cursor", AgentKind::Cursor),
    AgentSignature::new("opencode", AgentKind::OpenCode),
    AgentSignature::new("aider", AgentKind::Aider),
    AgentSignature::new("windsurf", AgentKind::Windsurf),
    AgentSignature::new("gemini", AgentKind::Gemini),
    AgentSignature::new("codex", AgentKind::Codex),
    AgentSignature::new("claude", AgentKind::Claude),
];

/// Immutable, ordered signature table.
#[derive(Debug, Clone)]
pub struct SignatureTable {
    signatures: Vec<AgentSignature>,
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The ancestor that matched and the signature it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    pub record: ProcessRecord,
    pub signature: AgentSignature,
}

/// Outcome of running the matcher over an ancestry walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub agent: AgentKind,
    pub matched: Option<SignatureMatch>,
    /// Number of ancestors inspected, including the matching one.
    pub visited: usize,
}

impl Detection {
    pub fn unknown(visited: usize) -> Self {
        Self {
            agent: AgentKind::Unknown,
            matched: None,
            visited,
        }
    }

    /// Depth of the matching ancestor, if any.
    pub fn depth(&self) -> Option<u32> {
        self.matched.as_ref().map(|m| m.record.depth)
    }
}

impl SignatureTable {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_SIGNATURES.to_vec())
    }

    /// Patterns must already be lowercase.
    pub fn new(signatures: Vec<AgentSignature>) -> Self {
        debug_assert!(signatures
            .iter()
            .all(|s| s.pattern == s.pattern.to_lowercase()));
        Self { signatures }
    }

    pub fn signatures(&self) -> &[AgentSignature] {
        &self.signatures
    }

    /// First signature found in either the name or the command line.
    pub fn match_process(&self, name: &str, command_line: &str) -> Option<AgentSignature> {
        let name = name.to_lowercase();
        let command_line = command_line.to_lowercase();
        self.signatures
            .iter()
            .find(|sig| name.contains(sig.pattern) || command_line.contains(sig.pattern))
            .copied()
    }

    /// Consume `records` up to the first matching ancestor.
    pub fn detect<I>(&self, records: I) -> Detection
    where
        I: IntoIterator<Item = ProcessRecord>,
    {
        self.detect_inspecting(records, |_| {})
    }

    /// Like [`detect`](Self::detect), calling `inspect` on every visited record
    /// before it is matched.
    pub fn detect_inspecting<I, F>(&self, records: I, mut inspect: F) -> Detection
    where
        I: IntoIterator<Item = ProcessRecord>,
        F: FnMut(&ProcessRecord),
    {
        let mut visited = 0;
        for record in records {
            visited += 1;
            inspect(&record);
            if let Some(signature) = self.match_process(&record.name, &record.command_line()) {
                return Detection {
                    agent: signature.agent,
                    matched: Some(SignatureMatch { record, signature }),
                    visited,
                };
            }
        }
        Detection::unknown(visited)
    }
}
