//! Fuzz target for hook document patching.
//!
//! Any JSON document, for any target, must survive insert/contains/remove
//! without panicking, and insert must be idempotent.

#![no_main]

use arbitrary::Arbitrary;
use chime_core::hooks::patch::{contains, insert, remove};
use chime_core::hooks::TARGETS;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    target: u8,
    document: String,
}

fuzz_target!(|input: Input| {
    let Ok(mut doc) = serde_json::from_str::<serde_json::Value>(&input.document) else {
        return;
    };
    let target = &TARGETS[input.target as usize % TARGETS.len()];

    let had = contains(&doc, target, "chime");
    let inserted = insert(&mut doc, target, "chime");
    assert_eq!(inserted, !had);
    assert!(contains(&doc, target, "chime"));

    let snapshot = doc.clone();
    assert!(!insert(&mut doc, target, "chime"));
    assert_eq!(doc, snapshot);

    let outcome = remove(&mut doc, target, "chime");
    assert!(outcome.removed >= 1);
    assert!(!contains(&doc, target, "chime"));
});
