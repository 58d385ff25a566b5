use super::utils::section;
use crate::aggregate::evaluate_all;
use crate::context::EvaluationContext;
use crate::error::CheckError;
use crate::model::PolicyDocument;
use crate::scan::CheckFinding;
use crate::verify::ImageVerifier;
use admitguard_types::EnforcementMode;
use serde_json::{Value, json};

/// Run the policy set over every workload in the snapshot.
pub fn policy_violations(
    snapshot: &Value,
    policies: &[PolicyDocument],
    verifier: &dyn ImageVerifier,
) -> Result<CheckFinding, CheckError> {
    if policies.is_empty() {
        return Ok(CheckFinding::info("no admission policies configured"));
    }
    let workloads = section(snapshot, "workloads")?;

    let mut blocked = Vec::new();
    let mut enforce_violations = 0usize;
    let mut audit_violations = 0usize;
    for workload in workloads {
        let decision = evaluate_all(policies, &EvaluationContext::new(workload.clone()), verifier);
        if !decision.allowed {
            blocked.push(decision.resource.canonical());
        }
        for policy in &decision.policies {
            match policy.mode {
                EnforcementMode::Enforce => enforce_violations += policy.violations.len(),
                EnforcementMode::Audit => audit_violations += policy.violations.len(),
            }
        }
    }

    let details = json!({
        "workloads": workloads.len(),
        "policies": policies.len(),
        "blocked": blocked,
        "enforce_violations": enforce_violations,
        "audit_violations": audit_violations,
    });
    if !blocked.is_empty() {
        Ok(CheckFinding::fail(format!(
            "{} workload(s) blocked by enforce policies",
            blocked.len()
        ))
        .with_details(details))
    } else if audit_violations > 0 {
        Ok(CheckFinding::warn(format!(
            "{audit_violations} audit-only policy violation(s)"
        ))
        .with_details(details))
    } else {
        Ok(CheckFinding::pass(format!(
            "{} workload(s) admitted by {} policies",
            workloads.len(),
            policies.len()
        ))
        .with_details(details))
    }
}
