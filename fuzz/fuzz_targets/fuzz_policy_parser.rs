//! Fuzz target for policy document loading.
//!
//! Goal: YAML parsing and policy loading should **never panic** on any input.
//! Malformed documents must come back as errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = admitguard_repo::fuzz::parse_yaml_stream(text);
        let _ = admitguard_repo::fuzz::parse_policies(text);
    }
});
