//! Saved-report handling: schema dispatch, serialization and the renderable view.

use admitguard_render::{
    RenderableFact, RenderableFinding, RenderableReport, RenderableSeverity,
    RenderableVerdictStatus,
};
use admitguard_types::{
    AdmissionReport, CheckResult, CheckStatus, ComplianceReport, EnforcementMode, PolicyResult,
    RuleResult, SCHEMA_ADMISSION_REPORT_V1, SCHEMA_COMPLIANCE_REPORT_V1, ids, lookup_explanation,
};
use anyhow::Context;
use camino::Utf8Path;

#[derive(Clone, Debug)]
pub enum ReportVariant {
    Admission(AdmissionReport),
    Compliance(ComplianceReport),
}

pub fn parse_report_json(text: &str) -> anyhow::Result<ReportVariant> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    match schema.as_str() {
        SCHEMA_ADMISSION_REPORT_V1 => {
            let report: AdmissionReport =
                serde_json::from_value(value).context("parse admission report")?;
            Ok(ReportVariant::Admission(report))
        }
        SCHEMA_COMPLIANCE_REPORT_V1 => {
            let report: ComplianceReport =
                serde_json::from_value(value).context("parse compliance report")?;
            Ok(ReportVariant::Compliance(report))
        }
        _ => anyhow::bail!("unknown report schema: {schema}"),
    }
}

/// Read and parse a saved report file.
pub fn read_report(path: &Utf8Path) -> anyhow::Result<ReportVariant> {
    let text = admitguard_repo::read_text(path).context("read report")?;
    parse_report_json(&text)
}

pub fn serialize_report(report: &ReportVariant) -> anyhow::Result<Vec<u8>> {
    match report {
        ReportVariant::Admission(r) => {
            serde_json::to_vec_pretty(r).context("serialize admission report")
        }
        ReportVariant::Compliance(r) => {
            serde_json::to_vec_pretty(r).context("serialize compliance report")
        }
    }
}

pub fn to_renderable(report: &ReportVariant) -> RenderableReport {
    match report {
        ReportVariant::Admission(r) => admission_renderable(r),
        ReportVariant::Compliance(r) => compliance_renderable(r),
    }
}

fn admission_renderable(r: &AdmissionReport) -> RenderableReport {
    let mut findings = Vec::new();
    for decision in &r.decisions {
        let subject = decision.resource.canonical();
        for policy in &decision.policies {
            findings.extend(
                policy
                    .violations
                    .iter()
                    .map(|v| violation_finding(policy, v, &subject)),
            );
        }
    }

    let audit_only = findings
        .iter()
        .all(|f| f.severity != RenderableSeverity::Error);
    let verdict = if !r.allowed {
        RenderableVerdictStatus::Fail
    } else if !findings.is_empty() && audit_only {
        RenderableVerdictStatus::Warn
    } else {
        RenderableVerdictStatus::Pass
    };

    let blocked = r.decisions.iter().filter(|d| !d.allowed).count();
    RenderableReport {
        title: "Admitguard admission report".to_string(),
        verdict,
        facts: vec![
            RenderableFact::new("Resources", r.decisions.len()),
            RenderableFact::new("Blocked", blocked),
            RenderableFact::new("Violations", findings.len()),
        ],
        findings,
    }
}

fn violation_finding(policy: &PolicyResult, v: &RuleResult, subject: &str) -> RenderableFinding {
    let severity = match policy.mode {
        EnforcementMode::Enforce => RenderableSeverity::Error,
        EnforcementMode::Audit => RenderableSeverity::Warning,
    };
    let code = ids::reason_code(&v.reason).to_string();
    RenderableFinding {
        severity,
        source: format!("{}/{}", policy.policy, v.rule),
        message: v.message.clone().unwrap_or_else(|| v.reason.clone()),
        help: lookup_explanation(&code).map(|e| e.title.to_string()),
        code,
        subject: Some(subject.to_string()),
    }
}

fn compliance_renderable(r: &ComplianceReport) -> RenderableReport {
    let s = &r.summary;
    let verdict = if !s.passed_threshold {
        RenderableVerdictStatus::Fail
    } else if s.failed > 0 || s.warnings > 0 {
        RenderableVerdictStatus::Warn
    } else {
        RenderableVerdictStatus::Pass
    };

    RenderableReport {
        title: "Admitguard compliance report".to_string(),
        verdict,
        facts: vec![
            RenderableFact::new("Target", &r.target),
            RenderableFact::new("Profile", &r.profile),
            RenderableFact::new(
                "Score",
                format!("{} / 100 (threshold {})", s.score, s.threshold),
            ),
            RenderableFact::new(
                "Checks",
                format!(
                    "{} total, {} passed, {} failed, {} warnings, {} info",
                    s.total, s.passed, s.failed, s.warnings, s.info
                ),
            ),
        ],
        findings: r.checks.iter().filter_map(check_finding).collect(),
    }
}

fn check_finding(c: &CheckResult) -> Option<RenderableFinding> {
    let severity = match c.status {
        CheckStatus::Pass => return None,
        CheckStatus::Fail => RenderableSeverity::Error,
        CheckStatus::Warn => RenderableSeverity::Warning,
        CheckStatus::Info => RenderableSeverity::Info,
    };
    let code = c
        .details
        .get("reason")
        .and_then(|v| v.as_str())
        .unwrap_or(c.status.as_str())
        .to_string();
    Some(RenderableFinding {
        severity,
        source: c.name.clone(),
        code,
        message: c.message.clone(),
        subject: None,
        help: lookup_explanation(&c.name).map(|e| e.title.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use admitguard_types::{
        AdmissionDecision, ComplianceSummary, ResourceRef, RuleOutcome, ToolMeta,
    };
    use serde_json::json;
    use time::macros::datetime;

    fn tool() -> ToolMeta {
        ToolMeta {
            name: "admitguard".to_string(),
            version: "0.0.0".to_string(),
        }
    }

    fn admission(mode: EnforcementMode) -> AdmissionReport {
        let blocking = mode == EnforcementMode::Enforce;
        AdmissionReport {
            schema: SCHEMA_ADMISSION_REPORT_V1.to_string(),
            tool: tool(),
            started_at: datetime!(2026-01-01 0:00 UTC),
            finished_at: datetime!(2026-01-01 0:00 UTC),
            allowed: !blocking,
            decisions: vec![AdmissionDecision {
                resource: ResourceRef {
                    kind: "Pod".to_string(),
                    name: Some("web".to_string()),
                    namespace: Some("default".to_string()),
                },
                allowed: !blocking,
                policies: vec![PolicyResult {
                    policy: "require-tag".to_string(),
                    mode,
                    outcome: RuleOutcome::Deny,
                    blocking,
                    rules_evaluated: 1,
                    violations: vec![RuleResult {
                        rule: "image-tag".to_string(),
                        matched: true,
                        outcome: RuleOutcome::Deny,
                        reason: "pattern-violation".to_string(),
                        message: None,
                        fingerprint: Some("abc".to_string()),
                    }],
                }],
            }],
        }
    }

    fn compliance(passed_threshold: bool) -> ComplianceReport {
        ComplianceReport {
            schema: SCHEMA_COMPLIANCE_REPORT_V1.to_string(),
            tool: tool(),
            timestamp: datetime!(2026-01-01 0:00 UTC),
            target: "prod-vpc".to_string(),
            profile: "local".to_string(),
            duration_ms: 3,
            checks: vec![
                CheckResult {
                    name: ids::CHECK_NETWORK_FLOW_LOGS.to_string(),
                    status: CheckStatus::Pass,
                    message: "ok".to_string(),
                    details: json!({}),
                },
                CheckResult {
                    name: ids::CHECK_NETWORK_SEGMENTATION.to_string(),
                    status: CheckStatus::Fail,
                    message: "timed out".to_string(),
                    details: json!({"reason": "timeout", "timeout_ms": 10}),
                },
            ],
            summary: ComplianceSummary {
                score: 50,
                total: 2,
                passed: 1,
                failed: 1,
                warnings: 0,
                info: 0,
                threshold: 80,
                passed_threshold,
            },
        }
    }

    #[test]
    fn parse_dispatches_on_schema() {
        let text = serde_json::to_string(&admission(EnforcementMode::Enforce)).unwrap();
        assert!(matches!(
            parse_report_json(&text).unwrap(),
            ReportVariant::Admission(_)
        ));

        let text = serde_json::to_string(&compliance(false)).unwrap();
        assert!(matches!(
            parse_report_json(&text).unwrap(),
            ReportVariant::Compliance(_)
        ));

        let err = parse_report_json(r#"{"schema": "other.v9"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown report schema"));
    }

    #[test]
    fn serialize_then_parse_keeps_the_report() {
        let original = compliance(true);
        let bytes = serialize_report(&ReportVariant::Compliance(original.clone())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        match parse_report_json(&text).unwrap() {
            ReportVariant::Compliance(parsed) => assert_eq!(parsed, original),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn enforce_violation_renders_as_error() {
        let r = to_renderable(&ReportVariant::Admission(admission(EnforcementMode::Enforce)));
        assert_eq!(r.verdict, RenderableVerdictStatus::Fail);
        assert_eq!(r.findings.len(), 1);
        let f = &r.findings[0];
        assert_eq!(f.severity, RenderableSeverity::Error);
        assert_eq!(f.source, "require-tag/image-tag");
        assert_eq!(f.code, "pattern-violation");
        assert_eq!(f.subject.as_deref(), Some("Pod/default/web"));
        assert_eq!(f.help.as_deref(), Some("Pattern Violation"));
    }

    #[test]
    fn audit_violation_renders_as_warning() {
        let r = to_renderable(&ReportVariant::Admission(admission(EnforcementMode::Audit)));
        assert_eq!(r.verdict, RenderableVerdictStatus::Warn);
        assert_eq!(r.findings[0].severity, RenderableSeverity::Warning);
    }

    #[test]
    fn compliance_findings_skip_passes_and_use_detail_reason() {
        let r = to_renderable(&ReportVariant::Compliance(compliance(false)));
        assert_eq!(r.verdict, RenderableVerdictStatus::Fail);
        assert_eq!(r.findings.len(), 1);
        assert_eq!(r.findings[0].code, "timeout");
        assert_eq!(r.findings[0].source, ids::CHECK_NETWORK_SEGMENTATION);

        let r = to_renderable(&ReportVariant::Compliance(compliance(true)));
        assert_eq!(r.verdict, RenderableVerdictStatus::Warn);
    }
}
