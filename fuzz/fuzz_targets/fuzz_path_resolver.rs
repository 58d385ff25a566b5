//! Fuzz target for variable path resolution and substitution.
//!
//! Goal: path parsing and `{{ ... }}` substitution should **never panic** on
//! any expression. Unresolvable paths are errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_path_resolver
//! ```

#![no_main]

use admitguard_domain::EvaluationContext;
use admitguard_domain::resolve::{bind, parse_path, resolve, substitute_template};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    let Ok(expression) = std::str::from_utf8(data) else {
        return;
    };
    if expression.len() > 4096 {
        return;
    }

    let context = EvaluationContext::new(json!({
        "kind": "Pod",
        "metadata": {"name": "web", "labels": {"app.kubernetes.io/name": "web"}},
        "spec": {"containers": [{"name": "web", "image": "nginx:1.25"}]}
    }));

    let _ = parse_path(expression);
    let _ = resolve(expression, &context);
    let _ = substitute_template(expression, &context);
    if let Ok(pattern) = bind(&json!({ "metadata": { "name": expression } }), &context) {
        let _ = pattern.matches(context.resource());
    }
});
