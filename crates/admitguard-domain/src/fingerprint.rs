use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a rule denial.
///
/// Identity fields:
/// - policy name
/// - rule name
/// - reason (including its detail suffix)
/// - resource identity (`kind/namespace/name`)
pub fn fingerprint_for_violation(policy: &str, rule: &str, reason: &str, resource: &str) -> String {
    let canonical = [policy, rule, reason, resource].join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
