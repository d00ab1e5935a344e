//! Fuzz target for raw process argument buffers.
//!
//! `decode_procargs` (macOS KERN_PROCARGS2 layout) and `split_nul_args`
//! (Linux cmdline layout) must accept any bytes without panicking.

#![no_main]

use chime_core::detect::procargs::{decode_procargs, split_nul_args};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoded = decode_procargs(data);
    // argc comes from the buffer, but every argument must come from it too
    assert!(decoded.args.len() <= data.len());
    let _ = decoded.command_line();

    let _ = split_nul_args(data);
});
