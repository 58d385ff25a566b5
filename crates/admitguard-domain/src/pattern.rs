//! Structural pattern matching with wildcards.
//!
//! This module is the only place glob semantics live. Matching is total: any
//! combination of inputs yields `true` or `false`, never an error.
//!
//! - mapping vs mapping: every pattern key must exist in the document and match;
//!   extra document keys are ignored.
//! - sequence vs sequence: a one-element pattern applies to every document
//!   element; otherwise lengths must be equal and elements match pairwise.
//! - scalar vs scalar: `*` alone accepts any non-null scalar. Strings holding
//!   `*` or `?` are globs. Everything else is typed equality.
//! - any other pairing is a non-match.
//!
//! Values that came from variable substitution are [`Pattern::Literal`] leaves
//! and only ever compare by equality.

use serde_json::Value;

/// A pattern ready for matching.
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    /// A scalar written in the policy. Wildcards are live.
    Leaf(Value),
    /// A scalar taken from the evaluation context. Compared by typed equality.
    Literal(Value),
    Mapping(Vec<(String, Pattern)>),
    Sequence(Vec<Pattern>),
}

impl Pattern {
    /// Policy text as a pattern, every scalar a [`Pattern::Leaf`].
    pub fn from_value(value: &Value) -> Self {
        Self::build(value, Self::Leaf)
    }

    /// Resolved data as a pattern, every scalar a [`Pattern::Literal`].
    pub fn literal(value: &Value) -> Self {
        Self::build(value, Self::Literal)
    }

    fn build(value: &Value, scalar: fn(Value) -> Self) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(
                map.iter()
                    .map(|(key, v)| (key.clone(), Self::build(v, scalar)))
                    .collect(),
            ),
            Value::Array(items) => {
                Self::Sequence(items.iter().map(|v| Self::build(v, scalar)).collect())
            }
            other => scalar(other.clone()),
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        match (self, document) {
            (Self::Mapping(entries), Value::Object(d)) => entries
                .iter()
                .all(|(key, p)| d.get(key).is_some_and(|dv| p.matches(dv))),
            (Self::Sequence(items), Value::Array(d)) => sequence_matches(items, d),
            (Self::Mapping(_) | Self::Sequence(_), _) => false,
            (_, Value::Object(_) | Value::Array(_)) => false,
            (Self::Leaf(p), d) => scalar_matches(p, d),
            (Self::Literal(p), d) => scalar_equals(p, d),
        }
    }
}

pub fn matches(pattern: &Value, document: &Value) -> bool {
    Pattern::from_value(pattern).matches(document)
}

fn sequence_matches(pattern: &[Pattern], document: &[Value]) -> bool {
    if let [predicate] = pattern {
        return document.iter().all(|item| predicate.matches(item));
    }
    pattern.len() == document.len()
        && pattern
            .iter()
            .zip(document)
            .all(|(p, d)| p.matches(d))
}

fn scalar_matches(pattern: &Value, document: &Value) -> bool {
    match pattern {
        Value::String(p) if p == "*" => !document.is_null(),
        Value::String(p) if is_glob(p) => {
            scalar_text(document).is_some_and(|text| glob_match(p, &text))
        }
        _ => scalar_equals(pattern, document),
    }
}

fn scalar_equals(pattern: &Value, document: &Value) -> bool {
    match pattern {
        Value::String(p) => document.as_str() == Some(p.as_str()),
        Value::Number(p) => match document {
            Value::Number(d) => p == d || p.as_f64().zip(d.as_f64()).is_some_and(|(a, b)| a == b),
            _ => false,
        },
        Value::Bool(p) => document.as_bool() == Some(*p),
        Value::Null => document.is_null(),
        Value::Object(_) | Value::Array(_) => false,
    }
}

pub(crate) fn is_glob(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Text form of a scalar for glob comparison. Null has none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Escape `text` so that [`glob_match`] treats every character literally.
pub fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Clone, Copy, Debug)]
enum Token {
    Literal(char),
    One,
    /// Any run of characters not containing the delimiter.
    Star(Option<char>),
}

fn tokenize(glob: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            '?' => Token::One,
            '*' if matches!(tokens.last(), Some(Token::Star(_))) => continue,
            '*' => Token::Star(None),
            other => Token::Literal(other),
        };
        tokens.push(token);
    }

    let mut following = None;
    for token in tokens.iter_mut().rev() {
        match token {
            Token::Star(delimiter) => {
                *delimiter = following;
                following = None;
            }
            Token::Literal(c) => following = Some(*c),
            Token::One => following = None,
        }
    }
    tokens
}

/// Match `text` against a glob.
///
/// `?` matches exactly one character. `*` matches any run of characters that
/// does not contain the literal character following it in the glob, so `*:*`
/// needs a colon and `*.example.com` covers a single DNS label. A trailing `*`
/// matches the rest of the text. A backslash makes the next character literal.
///
/// Runs in `O(glob * text)` time.
pub fn glob_match(glob: &str, text: &str) -> bool {
    let tokens = tokenize(glob);
    let text: Vec<char> = text.chars().collect();
    let n = text.len();

    // `next[j]`: the tokens after the current one match `text[j..]`.
    let mut next = vec![false; n + 1];
    next[n] = true;
    let mut row = vec![false; n + 1];
    for token in tokens.iter().rev() {
        for j in (0..=n).rev() {
            row[j] = match *token {
                Token::Literal(c) => j < n && text[j] == c && next[j + 1],
                Token::One => j < n && next[j + 1],
                Token::Star(delimiter) => {
                    next[j] || (j < n && Some(text[j]) != delimiter && row[j + 1])
                }
            };
        }
        std::mem::swap(&mut next, &mut row);
    }
    next[0]
}
