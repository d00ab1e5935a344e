//! chime common types.
//!
//! This crate provides the vocabulary shared by the chime library and binary:
//! - Agent kinds recognised by ancestry detection
//! - Process identity wrapper
//! - Output formats

pub mod agent;
pub mod id;
pub mod output;

pub use agent::AgentKind;
pub use id::ProcessId;
pub use output::OutputFormat;
