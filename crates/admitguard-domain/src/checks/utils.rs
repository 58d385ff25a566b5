use crate::error::CheckError;
use crate::resolve::resolve_in;
use serde_json::Value;

pub const ANY_IPV4: &str = "0.0.0.0/0";
pub const ANY_IPV6: &str = "::/0";

/// A sequence section of the snapshot. Missing sections are check errors.
pub fn section<'a>(snapshot: &'a Value, path: &str) -> Result<&'a [Value], CheckError> {
    resolve_in(path, snapshot)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CheckError::InvalidSnapshot {
            path: path.to_string(),
            expected: "a sequence",
        })
}

/// Optional sequence field on an item; absent or non-sequence reads as empty.
pub fn list<'a>(item: &'a Value, key: &str) -> &'a [Value] {
    item.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn bool_field(item: &Value, key: &str) -> bool {
    item.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Display identity of a snapshot item.
pub fn id_of(item: &Value) -> String {
    str_field(item, "id")
        .or_else(|| str_field(item, "name"))
        .unwrap_or("<unnamed>")
        .to_string()
}

pub fn is_open_cidr(cidr: Option<&str>) -> bool {
    matches!(cidr, Some(ANY_IPV4) | Some(ANY_IPV6))
}

pub fn is_allow(entry: &Value) -> bool {
    str_field(entry, "action").is_some_and(|a| a.eq_ignore_ascii_case("allow"))
}

pub fn is_deny(entry: &Value) -> bool {
    str_field(entry, "action").is_some_and(|a| a.eq_ignore_ascii_case("deny"))
}

/// Inclusive port range of an entry. `None` means every port.
pub fn port_range(entry: &Value) -> Option<(u64, u64)> {
    if let Some(port) = entry.get("port").and_then(Value::as_u64) {
        return Some((port, port));
    }
    let from = entry.get("from_port").and_then(Value::as_u64)?;
    let to = entry.get("to_port").and_then(Value::as_u64)?;
    Some((from, to))
}

pub fn covers_port(entry: &Value, port: u64) -> bool {
    port_range(entry).is_none_or(|(lo, hi)| lo <= port && port <= hi)
}

/// Whether an entry applies to every port.
pub fn covers_all_ports(entry: &Value) -> bool {
    port_range(entry).is_none_or(|(lo, hi)| lo == 0 && hi >= 65535)
}

pub fn describe_ports(entry: &Value) -> String {
    match port_range(entry) {
        None => "all ports".to_string(),
        Some((lo, hi)) if lo == hi => format!("port {lo}"),
        Some((lo, hi)) => format!("ports {lo}-{hi}"),
    }
}
