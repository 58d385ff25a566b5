use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// Stable schema identifiers for admitguard reports.
pub const SCHEMA_ADMISSION_REPORT_V1: &str = "admitguard.admission.v1";
pub const SCHEMA_COMPLIANCE_REPORT_V1: &str = "admitguard.compliance.v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

// ============================================================================
// Admission (policy evaluation)
// ============================================================================

/// How a policy's denials are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    /// Violations block admission.
    Enforce,
    /// Violations are recorded but never block.
    Audit,
}

impl EnforcementMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EnforcementMode::Enforce => "enforce",
            EnforcementMode::Audit => "audit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RuleOutcome {
    Allow,
    Deny,
    NotApplicable,
}

impl RuleOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleOutcome::Allow => "allow",
            RuleOutcome::Deny => "deny",
            RuleOutcome::NotApplicable => "not-applicable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleResult {
    pub rule: String,
    pub matched: bool,
    pub outcome: RuleOutcome,
    pub reason: String,

    /// Author-supplied explanation for a validation denial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Stable identifier for dedup and trending, set on denials once the
    /// resource identity is known. Hash of `policy + rule + reason + resource`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyResult {
    pub policy: String,
    pub mode: EnforcementMode,
    pub outcome: RuleOutcome,
    /// True only for an `enforce` policy that denied.
    pub blocking: bool,
    pub rules_evaluated: u32,
    /// Every denying rule, in declaration order.
    pub violations: Vec<RuleResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceRef {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceRef {
    /// `kind/namespace/name` with missing parts left empty.
    pub fn canonical(&self) -> String {
        format!(
            "{}/{}/{}",
            self.kind,
            self.namespace.as_deref().unwrap_or(""),
            self.name.as_deref().unwrap_or("")
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdmissionDecision {
    pub resource: ResourceRef,
    pub allowed: bool,
    pub policies: Vec<PolicyResult>,
}

impl AdmissionDecision {
    pub fn violation_count(&self) -> usize {
        self.policies.iter().map(|p| p.violations.len()).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AdmissionReport {
    /// Versioned schema identifier for the report shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    /// True iff every decision is allowed.
    pub allowed: bool,
    pub decisions: Vec<AdmissionDecision>,
}

// ============================================================================
// Compliance (scan)
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warn => "WARN",
            CheckStatus::Info => "INFO",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    /// Check-specific structured payload (kept open-ended for forward compatibility).
    #[serde(default)]
    pub details: JsonValue,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComplianceSummary {
    pub score: u8,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub warnings: u32,
    pub info: u32,
    pub threshold: u8,
    pub passed_threshold: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComplianceReport {
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub target: String,
    pub profile: String,
    pub duration_ms: u64,
    pub checks: Vec<CheckResult>,
    pub summary: ComplianceSummary,
}
