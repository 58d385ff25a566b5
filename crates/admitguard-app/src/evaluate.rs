//! The `evaluate` use case: run a policy set against resource documents.

use admitguard_domain::verify::TrustStore;
use admitguard_domain::{EvaluationContext, RequestInfo, admission_report, evaluate_all};
use admitguard_types::{AdmissionReport, ToolMeta};
use anyhow::Context;
use camino::Utf8Path;
use time::OffsetDateTime;

/// Input for the evaluate use case.
#[derive(Clone, Debug)]
pub struct EvaluateInput<'a> {
    /// Policy directory, or a single policy file.
    pub policy_dir: &'a Utf8Path,
    /// Resource file; may hold several YAML documents.
    pub resources: &'a Utf8Path,
    /// Trust store used for `verifyImages` rules. Absent verifies nothing.
    pub trust_store: Option<&'a Utf8Path>,
    /// Request metadata exposed under `request.*`.
    pub request: RequestInfo,
}

#[derive(Clone, Debug)]
pub struct EvaluateOutput {
    pub report: AdmissionReport,
}

pub(crate) fn tool_meta() -> ToolMeta {
    ToolMeta {
        name: "admitguard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Load policies and resources, then decide each resource independently.
pub fn run_evaluate(input: EvaluateInput<'_>) -> anyhow::Result<EvaluateOutput> {
    let started_at = OffsetDateTime::now_utc();

    let policies =
        admitguard_repo::load_policy_dir(input.policy_dir).context("load policies")?;
    let resources = admitguard_repo::load_resources(input.resources).context("load resources")?;
    let verifier = match input.trust_store {
        Some(path) => admitguard_repo::load_trust_store(path)?,
        None => TrustStore::default(),
    };

    let mut request = input.request;
    if request.timestamp.is_none() {
        request.timestamp = Some(started_at);
    }

    let decisions: Vec<_> = resources
        .into_iter()
        .map(|resource| {
            let ctx = EvaluationContext::with_request(resource, &request);
            evaluate_all(&policies, &ctx, &verifier)
        })
        .collect();

    let finished_at = OffsetDateTime::now_utc();
    let report = admission_report(tool_meta(), started_at, finished_at, decisions);
    tracing::info!(
        policies = policies.len(),
        resources = report.decisions.len(),
        allowed = report.allowed,
        "admission evaluation finished"
    );
    Ok(EvaluateOutput { report })
}

/// Map an admission report to an exit code: 0 = allowed, 1 = blocked.
pub fn admission_exit_code(report: &AdmissionReport) -> i32 {
    if report.allowed { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admitguard_types::RuleOutcome;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write(root: &Utf8Path, name: &str, contents: &str) -> Utf8PathBuf {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    const REQUIRE_TAG: &str = r#"
name: require-tag
enforcementMode: enforce
rules:
  - name: image-tag
    match: {kinds: [Pod]}
    validate:
      message: container images need an explicit tag
      pattern:
        spec:
          containers:
            - image: "*:*"
"#;

    #[test]
    fn each_document_gets_its_own_decision() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let policies = write(&root, "policies/require-tag.yaml", REQUIRE_TAG);
        let resources = write(
            &root,
            "pods.yaml",
            r#"
kind: Pod
metadata: {name: tagged}
spec:
  containers: [{image: "nginx:latest"}]
---
kind: Pod
metadata: {name: untagged}
spec:
  containers: [{image: nginx}]
"#,
        );

        let output = run_evaluate(EvaluateInput {
            policy_dir: policies.parent().expect("dir"),
            resources: &resources,
            trust_store: None,
            request: RequestInfo::default(),
        })
        .expect("evaluate");

        let report = output.report;
        assert!(!report.allowed);
        assert_eq!(admission_exit_code(&report), 1);
        assert_eq!(report.decisions.len(), 2);
        assert!(report.decisions[0].allowed);
        assert!(!report.decisions[1].allowed);

        let violation = &report.decisions[1].policies[0].violations[0];
        assert_eq!(violation.outcome, RuleOutcome::Deny);
        assert_eq!(violation.reason, "pattern-violation");
        assert_eq!(
            violation.message.as_deref(),
            Some("container images need an explicit tag")
        );
        assert!(violation.fingerprint.is_some());
    }

    #[test]
    fn trust_store_feeds_image_verification() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let policies = write(
            &root,
            "signed.yaml",
            r#"
name: signed-images
enforcementMode: enforce
rules:
  - name: acme-signed
    match: {kinds: [Pod]}
    verifyImages:
      - image: "ghcr.io/acme/*"
        key: cosign.pub
"#,
        );
        let resources = write(
            &root,
            "pod.yaml",
            "kind: Pod\nmetadata: {name: app}\nspec:\n  containers: [{image: \"ghcr.io/acme/app:1.0\"}]\n",
        );
        let trust = write(
            &root,
            "trust.yaml",
            "keys:\n  - key: cosign.pub\n    images: [\"ghcr.io/acme/app:1.0\"]\n",
        );

        let untrusted = run_evaluate(EvaluateInput {
            policy_dir: &policies,
            resources: &resources,
            trust_store: None,
            request: RequestInfo::default(),
        })
        .expect("evaluate");
        assert!(!untrusted.report.allowed);

        let trusted = run_evaluate(EvaluateInput {
            policy_dir: &policies,
            resources: &resources,
            trust_store: Some(&trust),
            request: RequestInfo::default(),
        })
        .expect("evaluate");
        assert!(trusted.report.allowed);
        assert_eq!(admission_exit_code(&trusted.report), 0);
    }

    #[test]
    fn missing_resources_file_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let policies = write(&root, "p.yaml", REQUIRE_TAG);

        let err = run_evaluate(EvaluateInput {
            policy_dir: &policies,
            resources: &root.join("missing.yaml"),
            trust_store: None,
            request: RequestInfo::default(),
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("load resources"));
    }
}
