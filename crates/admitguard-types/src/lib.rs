//! Stable DTOs and IDs used across the admitguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted admission and compliance reports
//! - stable string IDs and reason codes
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod receipt;

pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use receipt::{
    AdmissionDecision, AdmissionReport, CheckResult, CheckStatus, ComplianceReport,
    ComplianceSummary, EnforcementMode, PolicyResult, ResourceRef, RuleOutcome, RuleResult,
    SCHEMA_ADMISSION_REPORT_V1, SCHEMA_COMPLIANCE_REPORT_V1, ToolMeta,
};
