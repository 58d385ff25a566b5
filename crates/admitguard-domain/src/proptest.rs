//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Pattern matching determinism and wildcard semantics
//! - Variable substitution idempotence
//! - Non-short-circuiting aggregation and audit-mode behavior
//! - Score monotonicity

use crate::aggregate::{evaluate_all, evaluate_policy};
use crate::context::EvaluationContext;
use crate::model::{
    EnforcementMode, MatchSelector, PolicyDocument, Rule, RuleBody, ValidationSpec,
};
use crate::pattern::matches;
use crate::policy::ScoringConfig;
use crate::resolve::{bind, substitute};
use crate::score::{StatusCounts, score};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Scalars without template braces so substitution leaves them alone.
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z0-9:./*?-]{0,12}".prop_map(Value::String),
    ]
}

fn arb_non_null_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z0-9:./-]{0,12}".prop_map(Value::String),
    ]
}

/// Scalars that never read as globs.
fn arb_plain_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), arb_non_null_scalar()]
}

fn arb_tree<S>(leaf: S) -> impl Strategy<Value = Value>
where
    S: Strategy<Value = Value> + 'static,
{
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// Arbitrary nested document trees.
fn arb_value() -> impl Strategy<Value = Value> {
    arb_tree(arb_scalar())
}

/// Nested trees whose strings hold no glob characters.
fn arb_plain_value() -> impl Strategy<Value = Value> {
    arb_tree(arb_plain_scalar())
}

fn arb_run_as_non_root() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..6)
}

fn pod(containers: Vec<Value>) -> EvaluationContext {
    EvaluationContext::new(json!({
        "kind": "Pod",
        "metadata": {"name": "p"},
        "spec": {"containers": containers}
    }))
}

fn violating_policy(mode: EnforcementMode, rule_count: usize) -> PolicyDocument {
    let rules = (0..rule_count)
        .map(|i| Rule {
            name: format!("rule-{i}"),
            selector: MatchSelector::for_kinds(["Pod"]),
            body: RuleBody::Validation(ValidationSpec {
                pattern: json!({"spec": {"missing": i}}),
                message: None,
            }),
        })
        .collect();
    PolicyDocument {
        name: format!("{}-policy", mode.as_str()),
        mode,
        rules,
    }
}

fn no_verify(_: &str, _: &str) -> bool {
    false
}

// ============================================================================
// Pattern matcher properties
// ============================================================================

proptest! {
    #[test]
    fn matching_is_deterministic(pattern in arb_value(), doc in arb_value()) {
        let first = matches(&pattern, &doc);
        let second = matches(&pattern, &doc);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_plain_document_matches_itself(doc in arb_plain_value()) {
        prop_assert!(matches(&doc, &doc));
    }

    #[test]
    fn star_matches_any_non_null_scalar(value in arb_non_null_scalar()) {
        let hit = matches(&json!({"field": "*"}), &json!({"field": value}));
        prop_assert!(hit);
    }

    #[test]
    fn star_never_matches_null_or_containers(doc in prop_oneof![
        Just(Value::Null),
        Just(json!([])),
        Just(json!({})),
    ]) {
        prop_assert!(!matches(&json!("*"), &doc));
    }

    #[test]
    fn single_element_sequence_is_universal(flags in arb_run_as_non_root()) {
        let pattern = json!({"containers": [{"securityContext": {"runAsNonRoot": true}}]});
        let doc = json!({"containers": flags
            .iter()
            .map(|f| json!({"securityContext": {"runAsNonRoot": f}}))
            .collect::<Vec<_>>()});
        prop_assert_eq!(matches(&pattern, &doc), flags.iter().all(|f| *f));
    }
}

// ============================================================================
// Substitution properties
// ============================================================================

proptest! {
    #[test]
    fn substitution_is_idempotent(name in "[a-z][a-z0-9-]{0,10}", replicas in 0u32..100) {
        let ctx = EvaluationContext::new(json!({
            "kind": "Pod",
            "metadata": {"name": name.clone()},
            "spec": {"replicas": replicas}
        }));
        let pattern = json!({
            "metadata": {"name": "{{ request.object.metadata.name }}"},
            "spec": {"replicas": "{{request.object.spec.replicas}}"},
            "note": "pod {{ request.object.metadata.name }}"
        });
        let once = substitute(&pattern, &ctx).unwrap();
        let twice = substitute(&once, &ctx).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(&once["metadata"]["name"], &json!(name));
        prop_assert_eq!(&once["spec"]["replicas"], &json!(replicas));
    }

    #[test]
    fn bound_values_match_only_their_exact_text(
        bound in "[a-z*?]{1,8}",
        actual in "[a-z*?]{1,8}",
    ) {
        let ctx = EvaluationContext::new(json!({"metadata": {"name": bound.clone()}}));
        let pattern = bind(&json!({"name": "{{ request.object.metadata.name }}"}), &ctx).unwrap();
        let hit = pattern.matches(&json!({"name": actual.clone()}));
        prop_assert_eq!(hit, bound == actual);
    }

    #[test]
    fn literal_patterns_are_unchanged_by_substitution(pattern in arb_value()) {
        let ctx = EvaluationContext::new(json!({}));
        prop_assert_eq!(substitute(&pattern, &ctx).unwrap(), pattern);
    }
}

// ============================================================================
// Aggregation properties
// ============================================================================

proptest! {
    #[test]
    fn aggregation_reports_every_violation(rule_count in 1usize..8) {
        let policy = violating_policy(EnforcementMode::Enforce, rule_count);
        let result = evaluate_policy(&policy, &pod(vec![]), &no_verify);
        prop_assert_eq!(result.violations.len(), rule_count);
    }

    #[test]
    fn audit_never_blocks_and_enforce_always_does(
        audit_rules in 1usize..5,
        enforce_rules in 0usize..3,
    ) {
        let mut policies = vec![violating_policy(EnforcementMode::Audit, audit_rules)];
        if enforce_rules > 0 {
            policies.push(violating_policy(EnforcementMode::Enforce, enforce_rules));
        }
        let decision = evaluate_all(&policies, &pod(vec![]), &no_verify);
        prop_assert_eq!(decision.allowed, enforce_rules == 0);
        prop_assert_eq!(decision.violation_count(), audit_rules + enforce_rules);
    }
}

// ============================================================================
// Scoring properties
// ============================================================================

fn arb_counts() -> impl Strategy<Value = StatusCounts> {
    (0u32..50, 0u32..50, 0u32..50, 0u32..50).prop_map(|(pass, fail, warn, info)| StatusCounts {
        pass,
        fail,
        warn,
        info,
    })
}

fn arb_scoring() -> impl Strategy<Value = ScoringConfig> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(warn_weight, info_weight)| ScoringConfig {
        warn_weight,
        info_weight,
        ..ScoringConfig::default()
    })
}

proptest! {
    #[test]
    fn adding_a_pass_never_lowers_the_score(counts in arb_counts(), scoring in arb_scoring()) {
        prop_assume!(counts.total() > 0);
        let before = score(&counts, &scoring).unwrap();
        let after = score(&StatusCounts { pass: counts.pass + 1, ..counts }, &scoring).unwrap();
        prop_assert!(after >= before);
    }

    #[test]
    fn adding_a_fail_never_raises_the_score(counts in arb_counts(), scoring in arb_scoring()) {
        prop_assume!(counts.total() > 0);
        let before = score(&counts, &scoring).unwrap();
        let after = score(&StatusCounts { fail: counts.fail + 1, ..counts }, &scoring).unwrap();
        prop_assert!(after <= before);
    }

    #[test]
    fn score_stays_within_bounds(counts in arb_counts(), scoring in arb_scoring()) {
        prop_assume!(counts.total() > 0);
        let s = score(&counts, &scoring).unwrap();
        prop_assert!(s <= 100);
    }
}
