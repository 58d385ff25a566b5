use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `admitguard.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AdmitguardConfigV1 {
    /// Optional schema string for tooling (`admitguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Environment profile: `local`, `staging` or `production`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Check categories to run. Omitted or `["all"]` runs every category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    /// Score (0-100) needed for the scan to pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_threshold: Option<u32>,

    /// Run checks concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Scan-level timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfigV1>,

    /// Map of check_id -> config.
    #[serde(default)]
    pub checks: BTreeMap<String, CheckConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoringConfigV1 {
    /// Contribution of a WARN result toward the pass count (0.0 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_weight: Option<f64>,

    /// Contribution of an INFO result toward the pass count (0.0 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_weight: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckConfig {
    /// Override preset enable/disable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}
