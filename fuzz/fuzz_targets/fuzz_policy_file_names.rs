//! Fuzz target for policy file discovery globs.
//!
//! Goal: matching candidate names against the policy globs should **never
//! panic**, whatever the names contain.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_file_names
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct NamesInput {
    candidates: Vec<String>,
}

fuzz_target!(|input: NamesInput| {
    if input.candidates.len() > 100 {
        return;
    }
    let candidates: Vec<String> = input
        .candidates
        .into_iter()
        .filter(|c| c.len() <= 512)
        .collect();

    let _ = admitguard_repo::fuzz::match_policy_names(&candidates);
});
