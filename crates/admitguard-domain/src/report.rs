//! Report assembly. Values in, report out; timestamps come from the caller.

use crate::error::ScanError;
use crate::policy::EffectiveConfig;
use crate::scan::{CheckRef, run_checks, select_checks};
use crate::score::summarize;
use admitguard_types::{
    AdmissionDecision, AdmissionReport, ComplianceReport, SCHEMA_ADMISSION_REPORT_V1,
    SCHEMA_COMPLIANCE_REPORT_V1, ToolMeta,
};
use serde_json::Value;
use std::time::Instant;
use time::OffsetDateTime;

/// Identity of one scan invocation.
#[derive(Clone, Debug)]
pub struct ScanMeta {
    pub tool: ToolMeta,
    pub target: String,
    pub timestamp: OffsetDateTime,
}

/// Select, run and score checks against a snapshot.
///
/// Fails only when nothing is selected. Individual check failures are data.
pub fn run_scan(
    checks: &[CheckRef],
    snapshot: &Value,
    cfg: &EffectiveConfig,
    meta: ScanMeta,
) -> Result<ComplianceReport, ScanError> {
    let selected = select_checks(checks, cfg);
    if selected.is_empty() {
        return Err(ScanError::EmptyCheckSet);
    }

    let started = Instant::now();
    let results = run_checks(&selected, snapshot, &cfg.execution);
    let duration_ms = started.elapsed().as_millis() as u64;

    let summary = summarize(&results, &cfg.scoring)?;
    tracing::info!(
        target_name = %meta.target,
        profile = %cfg.profile,
        score = summary.score,
        total = summary.total,
        failed = summary.failed,
        "compliance scan finished"
    );

    Ok(ComplianceReport {
        schema: SCHEMA_COMPLIANCE_REPORT_V1.to_string(),
        tool: meta.tool,
        timestamp: meta.timestamp,
        target: meta.target,
        profile: cfg.profile.clone(),
        duration_ms,
        checks: results,
        summary,
    })
}

pub fn admission_report(
    tool: ToolMeta,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    decisions: Vec<AdmissionDecision>,
) -> AdmissionReport {
    let allowed = decisions.iter().all(|d| d.allowed);
    AdmissionReport {
        schema: SCHEMA_ADMISSION_REPORT_V1.to_string(),
        tool,
        started_at,
        finished_at,
        allowed,
        decisions,
    }
}
