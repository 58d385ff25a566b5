//! In-memory policy document model.
//!
//! Documents are produced by [`crate::load`] and are immutable afterwards.

use serde_json::Value;
use std::collections::BTreeMap;

pub use admitguard_types::EnforcementMode;

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyDocument {
    pub name: String,
    pub mode: EnforcementMode,
    /// Evaluated in declaration order.
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub name: String,
    pub selector: MatchSelector,
    pub body: RuleBody,
}

/// What a rule checks once its selector matches. Exactly one per rule.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleBody {
    Validation(ValidationSpec),
    /// Non-empty; an image must verify against every entry whose glob it matches.
    ImageVerification(Vec<ImageVerificationSpec>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationSpec {
    /// Subset template; may contain wildcards and `{{ ... }}` expressions.
    pub pattern: Value,
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageVerificationSpec {
    /// Image reference glob, e.g. `ghcr.io/org/*`.
    pub image: String,
    pub key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSelector {
    pub kinds: Vec<String>,
    /// Empty means any namespace.
    pub namespaces: Vec<String>,
    /// Every entry must be present on the resource with an equal value.
    pub labels: BTreeMap<String, String>,
}

impl MatchSelector {
    pub fn for_kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn matches(&self, resource: &Value) -> bool {
        let Some(kind) = resource.get("kind").and_then(Value::as_str) else {
            return false;
        };
        if !self.kinds.iter().any(|k| k == kind) {
            return false;
        }

        let metadata = resource.get("metadata");
        if !self.namespaces.is_empty() {
            let ns = metadata
                .and_then(|m| m.get("namespace"))
                .and_then(Value::as_str);
            match ns {
                Some(ns) if self.namespaces.iter().any(|n| n == ns) => {}
                _ => return false,
            }
        }

        let labels = metadata.and_then(|m| m.get("labels"));
        self.labels.iter().all(|(key, want)| {
            labels
                .and_then(|l| l.get(key))
                .and_then(Value::as_str)
                .is_some_and(|have| have == want)
        })
    }
}
