//! Path expressions and `{{ ... }}` substitution.
//!
//! An expression is a dot/bracket path such as
//! `request.object.spec.containers[0].image` or `metadata.labels["app.kubernetes.io/name"]`.
//! Resolution is all-or-nothing: a missing key, an out-of-bounds index or an
//! attempt to index into a scalar fails with [`ResolutionError`].

use crate::context::EvaluationContext;
use crate::error::ResolutionError;
use crate::pattern::{self, Pattern};
use serde_json::{Map, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Split an expression into path segments.
pub fn parse_path(expression: &str) -> Result<Vec<Segment>, ResolutionError> {
    let expr = expression.trim();
    let fail = || ResolutionError::new(expr);
    if expr.is_empty() {
        return Err(fail());
    }

    let chars: Vec<char> = expr.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;
    let mut expect_key = true;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                if expect_key {
                    return Err(fail());
                }
                expect_key = true;
                i += 1;
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']').ok_or_else(fail)? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let inner = inner.trim();
                let segment = if let Some(quoted) = strip_quotes(inner) {
                    Segment::Key(quoted.to_string())
                } else {
                    Segment::Index(inner.parse().map_err(|_| fail())?)
                };
                // A bracket may follow a key directly or open the expression.
                if expect_key && !segments.is_empty() {
                    return Err(fail());
                }
                segments.push(segment);
                expect_key = false;
                i = close + 1;
            }
            _ => {
                if !expect_key {
                    return Err(fail());
                }
                let start = i;
                while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                    i += 1;
                }
                let key: String = chars[start..i].iter().collect();
                let key = key.trim();
                if key.is_empty() {
                    return Err(fail());
                }
                segments.push(Segment::Key(key.to_string()));
                expect_key = false;
            }
        }
    }

    if expect_key {
        return Err(fail());
    }
    Ok(segments)
}

fn strip_quotes(s: &str) -> Option<&str> {
    s.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
}

/// Resolve an expression against a document tree.
pub fn resolve_in<'a>(expression: &str, root: &'a Value) -> Result<&'a Value, ResolutionError> {
    let segments = parse_path(expression)?;
    let mut current = root;
    for segment in &segments {
        let next = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(idx), Value::Array(items)) => items.get(*idx),
            _ => None,
        };
        current = next.ok_or_else(|| ResolutionError::new(expression.trim()))?;
    }
    Ok(current)
}

/// Resolve an expression against an evaluation context.
pub fn resolve(expression: &str, context: &EvaluationContext) -> Result<Value, ResolutionError> {
    resolve_in(expression, context.root()).cloned()
}

/// Replace every `{{ expr }}` in a pattern's values.
///
/// A value that is exactly one expression takes the resolved value with its
/// type. Expressions embedded in longer strings are interpolated as text.
/// Substituted text is not scanned again.
pub fn substitute(pattern: &Value, context: &EvaluationContext) -> Result<Value, ResolutionError> {
    match pattern {
        Value::String(s) => substitute_leaf(s, context),
        Value::Array(items) => items
            .iter()
            .map(|item| substitute(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(key.clone(), substitute(value, context)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_leaf(s: &str, context: &EvaluationContext) -> Result<Value, ResolutionError> {
    if let Some(expr) = whole_expression(s) {
        return resolve(expr, context);
    }
    substitute_template(s, context).map(Value::String)
}

/// The inner expression when `s` is exactly `{{ expr }}`.
fn whole_expression(s: &str) -> Option<&str> {
    let inner = s.trim().strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    (!inner.contains(OPEN) && !inner.contains(CLOSE)).then_some(inner)
}

/// Substitute every `{{ expr }}` in a pattern and prepare it for matching.
///
/// Resolved values become [`Pattern::Literal`] leaves, so wildcard characters
/// in resource data never act as globs. In a string that is itself a glob,
/// interpolated text is escaped.
pub fn bind(pattern: &Value, context: &EvaluationContext) -> Result<Pattern, ResolutionError> {
    match pattern {
        Value::String(s) => bind_leaf(s, context),
        Value::Array(items) => items
            .iter()
            .map(|item| bind(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Pattern::Sequence),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), bind(value, context)?)))
            .collect::<Result<Vec<_>, ResolutionError>>()
            .map(Pattern::Mapping),
        other => Ok(Pattern::Leaf(other.clone())),
    }
}

fn bind_leaf(s: &str, context: &EvaluationContext) -> Result<Pattern, ResolutionError> {
    if let Some(expr) = whole_expression(s) {
        return resolve(expr, context).map(|value| Pattern::literal(&value));
    }

    let pieces = pieces(s);
    if !pieces.iter().any(|p| matches!(p, Piece::Expr(_))) {
        return Ok(Pattern::Leaf(Value::String(s.to_string())));
    }
    let glob = pieces
        .iter()
        .any(|p| matches!(p, Piece::Text(t) if pattern::is_glob(t)));

    let mut out = String::with_capacity(s.len());
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Expr(expr) => {
                let text = text_of(resolve(expr, context)?);
                if glob {
                    out.push_str(&pattern::escape_glob(&text));
                } else {
                    out.push_str(&text);
                }
            }
        }
    }
    Ok(if glob {
        Pattern::Leaf(Value::String(out))
    } else {
        Pattern::Literal(Value::String(out))
    })
}

enum Piece<'a> {
    Text(&'a str),
    Expr(&'a str),
}

/// Split a template into text and expressions. An unterminated `{{` is text.
fn pieces(template: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        if start > 0 {
            out.push(Piece::Text(&rest[..start]));
        }
        out.push(Piece::Expr(&after[..end]));
        rest = &after[end + CLOSE.len()..];
    }
    if !rest.is_empty() {
        out.push(Piece::Text(rest));
    }
    out
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Interpolate every `{{ expr }}` in a string. Non-string values are rendered
/// as JSON text. An unterminated `{{` is kept literally.
pub fn substitute_template(
    template: &str,
    context: &EvaluationContext,
) -> Result<String, ResolutionError> {
    let mut out = String::with_capacity(template.len());
    for piece in pieces(template) {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Expr(expr) => out.push_str(&text_of(resolve(expr, context)?)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> EvaluationContext {
        EvaluationContext::new(json!({
            "kind": "Pod",
            "metadata": {"name": "web", "labels": {"app.kubernetes.io/name": "web"}},
            "spec": {"replicas": 3, "containers": [{"image": "nginx:1.25"}]}
        }))
    }

    #[test]
    fn parses_keys_indexes_and_quoted_keys() {
        assert_eq!(
            parse_path("a.b[2][\"c.d\"]").unwrap(),
            vec![
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Index(2),
                Segment::Key("c.d".into()),
            ]
        );
        assert!(parse_path("").is_err());
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a.").is_err());
        assert!(parse_path("a[x]").is_err());
        assert!(parse_path("a[0").is_err());
    }

    #[test]
    fn resolves_full_paths() {
        let c = ctx();
        assert_eq!(
            resolve("request.object.spec.containers[0].image", &c).unwrap(),
            json!("nginx:1.25")
        );
        assert_eq!(
            resolve("request.object.metadata.labels[\"app.kubernetes.io/name\"]", &c).unwrap(),
            json!("web")
        );
        assert_eq!(resolve("request.operation", &c).unwrap(), json!("CREATE"));
    }

    #[test]
    fn resolution_never_partially_succeeds() {
        let c = ctx();
        let missing = resolve("request.object.spec.volumes", &c).unwrap_err();
        assert_eq!(missing.path, "request.object.spec.volumes");
        assert!(resolve("request.object.spec.containers[5].image", &c).is_err());
        assert!(resolve("request.object.kind.name", &c).is_err());
        assert!(resolve("request.object.spec[0]", &c).is_err());
    }

    #[test]
    fn whole_leaf_substitution_keeps_type() {
        let c = ctx();
        let pattern = json!({"spec": {"replicas": "{{ request.object.spec.replicas }}"}});
        assert_eq!(substitute(&pattern, &c).unwrap(), json!({"spec": {"replicas": 3}}));
    }

    #[test]
    fn embedded_expressions_interpolate_as_text() {
        let c = ctx();
        assert_eq!(
            substitute_template("{{request.object.metadata.name}}-{{ request.object.spec.replicas }}", &c)
                .unwrap(),
            "web-3"
        );
        assert_eq!(substitute_template("plain {{ open", &c).unwrap(), "plain {{ open");
    }

    #[test]
    fn substitution_reports_unresolved_path() {
        let c = ctx();
        let pattern = json!({"metadata": {"namespace": "{{ request.object.metadata.namespace }}"}});
        let err = substitute(&pattern, &c).unwrap_err();
        assert_eq!(err.path, "request.object.metadata.namespace");
    }

    #[test]
    fn bound_values_are_literal() {
        let c = EvaluationContext::new(json!({
            "metadata": {"name": "*", "annotations": {"sa": "*"}},
            "spec": {"serviceAccountName": "cluster-admin"}
        }));
        let pattern = bind(
            &json!({"spec": {"serviceAccountName": "{{ request.object.metadata.annotations.sa }}"}}),
            &c,
        )
        .unwrap();
        assert!(!pattern.matches(c.resource()));

        let prefixed = bind(&json!({"spec": {"serviceAccountName": "cluster-{{ request.object.metadata.name }}"}}), &c)
            .unwrap();
        assert!(!prefixed.matches(c.resource()));
    }

    #[test]
    fn interpolated_text_in_a_glob_is_escaped() {
        let c = EvaluationContext::new(json!({"metadata": {"name": "a*"}}));
        let glob = bind(&json!("{{ request.object.metadata.name }}-*"), &c).unwrap();
        assert_eq!(glob, Pattern::Leaf(json!("a\\*-*")));
        assert!(glob.matches(&json!("a*-7")));
        assert!(!glob.matches(&json!("ab-7")));

        let plain = bind(&json!("x-{{ request.object.metadata.name }}"), &c).unwrap();
        assert_eq!(plain, Pattern::Literal(json!("x-a*")));
        assert_eq!(bind(&json!("nginx:*"), &c).unwrap(), Pattern::Leaf(json!("nginx:*")));
    }
}
