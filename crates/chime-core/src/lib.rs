//! chime core library
//!
//! This library provides:
//! - Detection of the calling coding agent from process ancestry
//! - Hook installation into agent tool config files
//! - Notification presets and delivery
//! - Exit codes, configuration and logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod detect;
pub mod exit_codes;
pub mod hooks;
pub mod logging;
pub mod notify;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock_process;
