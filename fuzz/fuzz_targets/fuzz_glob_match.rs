//! Fuzz target for wildcard matching.
//!
//! Goal: `glob_match` and the structural matcher should **never panic** and
//! stay fast on star-heavy globs. A glob without wildcards or escapes must
//! behave like string equality, and an escaped text must match itself.
//!
//! `corpus/fuzz_glob_match/` seeds a `*?*?...x` chain.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_glob_match
//! ```

#![no_main]

use admitguard_domain::pattern::{escape_glob, glob_match, matches};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

#[derive(Arbitrary, Debug)]
struct GlobInput {
    glob: String,
    text: String,
}

fuzz_target!(|input: GlobInput| {
    if input.glob.len() > 256 || input.text.len() > 1024 {
        return;
    }

    let hit = glob_match(&input.glob, &input.text);
    if !input.glob.contains(['*', '?', '\\']) {
        assert_eq!(hit, input.glob == input.text);
    }
    assert!(glob_match(&escape_glob(&input.text), &input.text));

    let _ = matches(&json!({ "field": input.glob }), &json!({ "field": input.text }));
});
