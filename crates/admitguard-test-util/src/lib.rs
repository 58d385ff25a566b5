//! Shared test utilities for the admitguard workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at
//! runtime (not behind `#[cfg(test)]`), so a `#[cfg(test)]` module inside
//! `admitguard-types` would not suffice.

use serde_json::Value;

const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// Two concerns are handled separately:
///
/// 1. **Root-only**: `tool.version` becomes `"__VERSION__"` and the
///    compliance `timestamp` becomes `"__TIMESTAMP__"`, but only when the
///    root object is an admitguard report (a `schema` starting with
///    `admitguard.` plus a `tool` object). Check `details` payloads that
///    happen to carry the same keys stay untouched.
///
/// 2. **Recursive**: `started_at`, `finished_at` and `duration_ms` are
///    normalized at any depth because their placeholder values are fixed and
///    cannot collide with real data.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_report = obj
            .get("schema")
            .and_then(Value::as_str)
            .is_some_and(|s| s.starts_with("admitguard."))
            && obj.get("tool").is_some_and(Value::is_object);
        if is_report {
            if let Some(tool_obj) = obj.get_mut("tool").and_then(Value::as_object_mut)
                && tool_obj.contains_key("version")
            {
                tool_obj.insert(
                    "version".to_string(),
                    Value::String("__VERSION__".to_string()),
                );
            }
            if obj.contains_key("timestamp") {
                obj.insert(
                    "timestamp".to_string(),
                    Value::String(TIMESTAMP_PLACEHOLDER.to_string()),
                );
            }
        }
    }
    normalize_timestamps_recursive(&mut value);
    value
}

fn normalize_timestamps_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at"] {
                if map.contains_key(key) {
                    map.insert(
                        key.to_string(),
                        Value::String(TIMESTAMP_PLACEHOLDER.to_string()),
                    );
                }
            }
            if map.contains_key("duration_ms") {
                map.insert("duration_ms".to_string(), Value::Number(0.into()));
            }
            for val in map.values_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        _ => {}
    }
}
