//! The `scan` use case: run the check battery against a target snapshot.

use crate::evaluate::tool_meta;
use admitguard_domain::checks::builtin_checks;
use admitguard_domain::verify::TrustStore;
use admitguard_domain::{ScanMeta, run_scan};
use admitguard_settings::{Overrides, ResolvedConfig};
use admitguard_types::ComplianceReport;
use anyhow::Context;
use camino::Utf8Path;
use std::sync::Arc;
use time::OffsetDateTime;

/// Input for the scan use case.
#[derive(Clone, Debug)]
pub struct ScanInput<'a> {
    /// Check-set contents (empty string means defaults).
    pub config_text: &'a str,
    /// Target snapshot file.
    pub target: &'a Utf8Path,
    /// Policies for `admission.policy_violations`. Absent means none.
    pub policy_dir: Option<&'a Utf8Path>,
    pub trust_store: Option<&'a Utf8Path>,
    /// CLI overrides.
    pub overrides: Overrides,
}

#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub report: ComplianceReport,
    pub resolved_config: ResolvedConfig,
}

/// Read a check-set file for [`ScanInput::config_text`].
pub fn read_check_set(path: &Utf8Path) -> anyhow::Result<String> {
    admitguard_repo::read_text(path).with_context(|| format!("read check set: {path}"))
}

/// Resolve config, load the snapshot and run every selected check.
pub fn run_scan_target(input: ScanInput<'_>) -> anyhow::Result<ScanOutput> {
    let cfg = if input.config_text.trim().is_empty() {
        admitguard_settings::AdmitguardConfigV1::default()
    } else {
        admitguard_settings::parse_config_toml(input.config_text).context("parse check set")?
    };
    let resolved = admitguard_settings::resolve_config(cfg, input.overrides.clone())
        .context("resolve check set")?;

    let snapshot = admitguard_repo::load_snapshot(input.target).context("load target")?;
    let policies = match input.policy_dir {
        Some(dir) => admitguard_repo::load_policy_dir(dir).context("load policies")?,
        None => Vec::new(),
    };
    let verifier = match input.trust_store {
        Some(path) => admitguard_repo::load_trust_store(path)?,
        None => TrustStore::default(),
    };

    let target = snapshot
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| input.target.to_string());

    let checks = builtin_checks(Arc::new(policies), Arc::new(verifier));
    let meta = ScanMeta {
        tool: tool_meta(),
        target,
        timestamp: OffsetDateTime::now_utc(),
    };
    let report = run_scan(&checks, &snapshot, &resolved.effective, meta)
        .context("run compliance scan")?;

    Ok(ScanOutput {
        report,
        resolved_config: resolved,
    })
}

/// Map a compliance report to an exit code: 0 = at or above threshold, 1 = below.
pub fn scan_exit_code(report: &ComplianceReport) -> i32 {
    if report.summary.passed_threshold { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admitguard_types::{CheckStatus, ids};
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write(root: &Utf8Path, name: &str, contents: &str) -> Utf8PathBuf {
        let path = root.join(name);
        std::fs::write(&path, contents).expect("write file");
        path
    }

    const IAM_ONLY: &str = r#"
name: sandbox
iam:
  roles:
    - name: app
      permission_boundary: arn:aws:iam::1:policy/boundary
    - name: admin
"#;

    #[test]
    fn iam_scan_scores_and_gates() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let target = write(&root, "target.yaml", IAM_ONLY);

        let output = run_scan_target(ScanInput {
            config_text: "categories = [\"iam\"]\n",
            target: &target,
            policy_dir: None,
            trust_store: None,
            overrides: Overrides::default(),
        })
        .expect("scan");

        let report = output.report;
        assert_eq!(report.target, "sandbox");
        assert_eq!(report.profile, "local");
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].name, ids::CHECK_IAM_PERMISSION_BOUNDARIES);
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
        assert_eq!(report.summary.score, 0);
        assert_eq!(scan_exit_code(&report), 1);
    }

    #[test]
    fn threshold_override_can_pass_the_gate() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let target = write(&root, "target.yaml", IAM_ONLY);

        let output = run_scan_target(ScanInput {
            config_text: "categories = [\"iam\"]\n",
            target: &target,
            policy_dir: None,
            trust_store: None,
            overrides: Overrides {
                profile: None,
                pass_threshold: Some(0),
            },
        })
        .expect("scan");
        assert_eq!(scan_exit_code(&output.report), 0);
    }

    #[test]
    fn missing_sections_fail_their_checks_without_aborting() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let target = write(&root, "target.json", "{}");

        let output = run_scan_target(ScanInput {
            config_text: "",
            target: &target,
            policy_dir: None,
            trust_store: None,
            overrides: Overrides::default(),
        })
        .expect("scan");

        let report = output.report;
        assert_eq!(report.target, target.as_str());
        let admission = report
            .checks
            .iter()
            .find(|c| c.name == ids::CHECK_ADMISSION_POLICY_VIOLATIONS)
            .expect("admission check ran");
        assert_eq!(admission.status, CheckStatus::Info);
        assert!(
            report
                .checks
                .iter()
                .filter(|c| c.name != ids::CHECK_ADMISSION_POLICY_VIOLATIONS)
                .all(|c| c.status == CheckStatus::Fail)
        );
    }

    #[test]
    fn disabling_every_selected_check_is_an_empty_check_set() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let target = write(&root, "target.yaml", IAM_ONLY);

        let err = run_scan_target(ScanInput {
            config_text: "categories = [\"iam\"]\n[checks.\"iam.permission_boundaries\"]\nenabled = false\n",
            target: &target,
            policy_dir: None,
            trust_store: None,
            overrides: Overrides::default(),
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("no compliance checks"), "{err:#}");
    }

    #[test]
    fn read_check_set_names_the_missing_file() {
        let err = read_check_set(Utf8Path::new("/definitely/not/here.toml")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("read check set: /definitely/not/here.toml"), "{msg}");
    }
}
