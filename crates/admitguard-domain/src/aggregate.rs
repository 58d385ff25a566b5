use crate::context::EvaluationContext;
use crate::fingerprint::fingerprint_for_violation;
use crate::model::{EnforcementMode, PolicyDocument};
use crate::rule::evaluate_rule;
use crate::verify::ImageVerifier;
use admitguard_types::{AdmissionDecision, PolicyResult, RuleOutcome};

/// Evaluate every rule of one policy in declaration order.
///
/// Never stops at the first denial: every denying rule lands in `violations`.
pub fn evaluate_policy(
    policy: &PolicyDocument,
    context: &EvaluationContext,
    verifier: &dyn ImageVerifier,
) -> PolicyResult {
    let mut any_allow = false;
    let mut violations = Vec::new();

    for rule in &policy.rules {
        let result = evaluate_rule(rule, policy.mode, context, verifier);
        match result.outcome {
            RuleOutcome::Deny => violations.push(result),
            RuleOutcome::Allow => any_allow = true,
            RuleOutcome::NotApplicable => {}
        }
    }

    let outcome = if !violations.is_empty() {
        RuleOutcome::Deny
    } else if any_allow {
        RuleOutcome::Allow
    } else {
        RuleOutcome::NotApplicable
    };
    let blocking = policy.mode == EnforcementMode::Enforce && outcome == RuleOutcome::Deny;

    tracing::debug!(
        policy = %policy.name,
        mode = policy.mode.as_str(),
        outcome = outcome.as_str(),
        violations = violations.len(),
        "policy evaluated"
    );

    PolicyResult {
        policy: policy.name.clone(),
        mode: policy.mode,
        outcome,
        blocking,
        rules_evaluated: policy.rules.len() as u32,
        violations,
    }
}

/// Evaluate an ordered policy set against one resource.
///
/// The resource is allowed iff no `enforce` policy denied. Audit denials are
/// recorded but never block. Every denial gets a fingerprint.
pub fn evaluate_all(
    policies: &[PolicyDocument],
    context: &EvaluationContext,
    verifier: &dyn ImageVerifier,
) -> AdmissionDecision {
    let resource = context.resource_ref();
    let identity = resource.canonical();

    let mut results: Vec<PolicyResult> = policies
        .iter()
        .map(|policy| evaluate_policy(policy, context, verifier))
        .collect();

    for result in &mut results {
        for violation in &mut result.violations {
            violation.fingerprint = Some(fingerprint_for_violation(
                &result.policy,
                &violation.rule,
                &violation.reason,
                &identity,
            ));
        }
    }

    let allowed = !results.iter().any(|r| r.blocking);
    AdmissionDecision {
        resource,
        allowed,
        policies: results,
    }
}
