use crate::context::EvaluationContext;
use crate::model::{EnforcementMode, ImageVerificationSpec, Rule, RuleBody, ValidationSpec};
use crate::pattern;
use crate::resolve;
use crate::verify::ImageVerifier;
use admitguard_types::ids;
use admitguard_types::{RuleOutcome, RuleResult};
use serde_json::Value;

/// Container list keys searched anywhere under the resource `spec`.
const CONTAINER_KEYS: &[&str] = &["containers", "initContainers", "ephemeralContainers"];

/// Evaluate one rule against one resource.
///
/// `mode` decides how an unresolved variable is treated: `enforce` denies,
/// `audit` makes the rule not applicable.
pub fn evaluate_rule(
    rule: &Rule,
    mode: EnforcementMode,
    context: &EvaluationContext,
    verifier: &dyn ImageVerifier,
) -> RuleResult {
    let resource = context.resource();
    if !rule.selector.matches(resource) {
        return result(rule, false, RuleOutcome::NotApplicable, ids::REASON_NO_MATCH.to_string());
    }

    let (outcome, reason) = match &rule.body {
        RuleBody::Validation(spec) => validate(spec, mode, context),
        RuleBody::ImageVerification(specs) => verify_images(specs, resource, verifier),
    };

    tracing::debug!(
        rule = %rule.name,
        outcome = outcome.as_str(),
        reason = %reason,
        "rule evaluated"
    );
    let mut out = result(rule, true, outcome, reason);
    if outcome == RuleOutcome::Deny
        && let RuleBody::Validation(spec) = &rule.body
    {
        out.message = spec.message.clone();
    }
    out
}

fn validate(
    spec: &ValidationSpec,
    mode: EnforcementMode,
    context: &EvaluationContext,
) -> (RuleOutcome, String) {
    let pattern = match resolve::bind(&spec.pattern, context) {
        Ok(p) => p,
        Err(err) => {
            let reason = ids::reason_with_detail(ids::REASON_VARIABLE_UNRESOLVED, &err.path);
            return match mode {
                EnforcementMode::Enforce => (RuleOutcome::Deny, reason),
                EnforcementMode::Audit => (RuleOutcome::NotApplicable, reason),
            };
        }
    };

    if pattern.matches(context.resource()) {
        (RuleOutcome::Allow, ids::REASON_PATTERN_SATISFIED.to_string())
    } else {
        (RuleOutcome::Deny, ids::REASON_PATTERN_VIOLATION.to_string())
    }
}

fn verify_images(
    specs: &[ImageVerificationSpec],
    resource: &Value,
    verifier: &dyn ImageVerifier,
) -> (RuleOutcome, String) {
    let mut any_matched = false;
    for image in container_images(resource) {
        for spec in specs.iter().filter(|s| pattern::glob_match(&s.image, image)) {
            any_matched = true;
            if !verifier.verify(image, &spec.key) {
                return (
                    RuleOutcome::Deny,
                    ids::reason_with_detail(ids::REASON_UNVERIFIED_IMAGE, image),
                );
            }
        }
    }

    if any_matched {
        (RuleOutcome::Allow, ids::REASON_IMAGES_VERIFIED.to_string())
    } else {
        (RuleOutcome::Allow, ids::REASON_NO_MATCHING_IMAGES.to_string())
    }
}

/// Every container image reference under `spec`, in document order.
pub fn container_images(resource: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    if let Some(spec) = resource.get("spec") {
        collect_images(spec, &mut out);
    }
    out
}

fn collect_images<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if CONTAINER_KEYS.contains(&key.as_str())
                    && let Value::Array(containers) = child
                {
                    out.extend(
                        containers
                            .iter()
                            .filter_map(|c| c.get("image").and_then(Value::as_str)),
                    );
                } else {
                    collect_images(child, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_images(item, out);
            }
        }
        _ => {}
    }
}

fn result(rule: &Rule, matched: bool, outcome: RuleOutcome, reason: String) -> RuleResult {
    RuleResult {
        rule: rule.name.clone(),
        matched,
        outcome,
        reason,
        message: None,
        fingerprint: None,
    }
}
