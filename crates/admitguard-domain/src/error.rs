use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingField,
    InvalidType,
    InvalidEnforcementMode,
    EmptyRuleSet,
    /// A rule declares both `validate` and `verifyImages`.
    AmbiguousRuleBody,
    DuplicateName,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseErrorKind::MissingField => "missing field",
            ParseErrorKind::InvalidType => "invalid type",
            ParseErrorKind::InvalidEnforcementMode => "invalid enforcement mode",
            ParseErrorKind::EmptyRuleSet => "empty rule set",
            ParseErrorKind::AmbiguousRuleBody => "rule declares both validate and verifyImages",
            ParseErrorKind::DuplicateName => "duplicate name",
        };
        f.write_str(s)
    }
}

/// Malformed policy input. Always surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at `{field}`")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Dotted path of the offending field within the policy source.
    pub field: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
        }
    }
}

/// A path expression that does not resolve against its context.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unresolved path `{path}`")]
pub struct ResolutionError {
    pub path: String,
}

impl ResolutionError {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Failure internal to a single compliance check.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CheckError {
    #[error("snapshot section missing: {0}")]
    Unresolved(#[from] ResolutionError),

    #[error("invalid snapshot data at `{path}`: expected {expected}")]
    InvalidSnapshot { path: String, expected: &'static str },

    #[error("probe failed: {0}")]
    Probe(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("no compliance checks selected")]
    EmptyCheckSet,
}
