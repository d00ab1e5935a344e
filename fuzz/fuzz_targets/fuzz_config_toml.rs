//! Fuzz target for config.toml parsing.

#![no_main]

use chime_core::config::ChimeConfig;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Should never panic, only return an error
        let _ = ChimeConfig::from_toml_str(text, Path::new("config.toml"));
    }
});
