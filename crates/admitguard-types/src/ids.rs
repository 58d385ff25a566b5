//! Stable identifiers for compliance checks and rule reason codes.
//!
//! `check_id` is a dotted namespace. Reason codes are kebab-case and may carry a
//! `:<detail>` suffix (for example `unverified-image:nginx:latest`).

// Checks: network
pub const CHECK_NETWORK_FLOW_LOGS: &str = "network.flow_logs";
pub const CHECK_NETWORK_ACL_COVERAGE: &str = "network.acl_coverage";
pub const CHECK_NETWORK_SEGMENTATION: &str = "network.segmentation";
pub const CHECK_NETWORK_SECURITY_GROUPS: &str = "network.security_groups";
pub const CHECK_NETWORK_PRIVATE_SUBNET_EXPOSURE: &str = "network.private_subnet_exposure";
pub const CHECK_NETWORK_NACL_DEFAULT_DENY: &str = "network.nacl_default_deny";

// Checks: iam
pub const CHECK_IAM_PERMISSION_BOUNDARIES: &str = "iam.permission_boundaries";

// Checks: admission
pub const CHECK_ADMISSION_POLICY_VIOLATIONS: &str = "admission.policy_violations";

// Check categories
pub const CATEGORY_NETWORK: &str = "network";
pub const CATEGORY_IAM: &str = "iam";
pub const CATEGORY_ADMISSION: &str = "admission";

// Rule reasons
pub const REASON_NO_MATCH: &str = "no-match";
pub const REASON_PATTERN_SATISFIED: &str = "pattern-satisfied";
pub const REASON_PATTERN_VIOLATION: &str = "pattern-violation";
pub const REASON_VARIABLE_UNRESOLVED: &str = "variable-unresolved";
pub const REASON_IMAGES_VERIFIED: &str = "images-verified";
pub const REASON_NO_MATCHING_IMAGES: &str = "no-matching-images";
pub const REASON_UNVERIFIED_IMAGE: &str = "unverified-image";

// Scan-level reasons recorded in check details
pub const REASON_TIMEOUT: &str = "timeout";
pub const REASON_CHECK_ERROR: &str = "check-error";

/// Join a reason code with its detail (`code:detail`).
pub fn reason_with_detail(code: &str, detail: &str) -> String {
    format!("{code}:{detail}")
}

/// Strip the `:<detail>` suffix from a reason, leaving the bare code.
pub fn reason_code(reason: &str) -> &str {
    reason.split_once(':').map(|(code, _)| code).unwrap_or(reason)
}
