//! The `explain` use case: remediation guidance for check ids and reason codes.

use admitguard_domain::checks::{CheckMeta, builtin_metas};
use admitguard_types::explain::{self, Explanation};
use admitguard_types::ids;
use std::fmt::Write as _;

/// What an identifier names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplainSubject {
    /// A built-in compliance check.
    Check(CheckMeta),
    /// A rule or check reason code, without any `:detail` suffix.
    Reason(&'static str),
}

#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found {
        subject: ExplainSubject,
        explanation: Explanation,
    },
    NotFound {
        identifier: String,
        available_check_ids: &'static [&'static str],
        available_codes: &'static [&'static str],
    },
}

pub fn run_explain(identifier: &str) -> ExplainOutput {
    let Some(explanation) = explain::lookup_explanation(identifier) else {
        return not_found(identifier);
    };

    let code = ids::reason_code(identifier);
    let subject = if let Some(meta) = builtin_metas().into_iter().find(|m| m.id == identifier) {
        ExplainSubject::Check(meta)
    } else if let Some(known) = explain::all_codes().iter().copied().find(|c| *c == code) {
        ExplainSubject::Reason(known)
    } else {
        return not_found(identifier);
    };
    ExplainOutput::Found {
        subject,
        explanation,
    }
}

fn not_found(identifier: &str) -> ExplainOutput {
    ExplainOutput::NotFound {
        identifier: identifier.to_string(),
        available_check_ids: explain::all_check_ids(),
        available_codes: explain::all_codes(),
    }
}

/// Terminal rendering: heading, the check's control (or the reason code), then guidance.
pub fn format_explanation(subject: &ExplainSubject, exp: &Explanation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", exp.title);
    let _ = writeln!(out, "{}", "=".repeat(exp.title.chars().count()));
    match subject {
        ExplainSubject::Check(meta) => {
            let _ = writeln!(out, "check:    {}", meta.id);
            let _ = writeln!(out, "category: {}", meta.category);
            let _ = writeln!(out, "priority: {}", meta.priority);
            let _ = writeln!(out, "control:  {}", meta.description);
        }
        ExplainSubject::Reason(code) => {
            let _ = writeln!(out, "reason:   {code}");
        }
    }
    let _ = write!(out, "\n{}\n\nRemediation\n-----------\n{}\n", exp.description, exp.remediation);
    let _ = write!(
        out,
        "\nBefore:\n```\n{}\n```\n\nAfter:\n```\n{}\n```\n",
        exp.examples.before, exp.examples.after
    );
    out
}

pub fn format_not_found(identifier: &str, check_ids: &[&str], codes: &[&str]) -> String {
    let mut out = format!("unknown check id or reason code: {identifier}\n\ncheck ids:\n");
    for id in check_ids {
        let _ = writeln!(out, "  {id}");
    }
    out.push_str("\nreason codes:\n");
    for code in codes {
        let _ = writeln!(out, "  {code}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use admitguard_domain::policy::Priority;

    fn found(identifier: &str) -> (ExplainSubject, Explanation) {
        match run_explain(identifier) {
            ExplainOutput::Found {
                subject,
                explanation,
            } => (subject, explanation),
            ExplainOutput::NotFound { .. } => panic!("expected an explanation for {identifier}"),
        }
    }

    #[test]
    fn check_ids_resolve_to_their_metadata() {
        let (subject, _) = found(ids::CHECK_NETWORK_SECURITY_GROUPS);
        let ExplainSubject::Check(meta) = subject else {
            panic!("expected a check subject");
        };
        assert_eq!(meta.category, ids::CATEGORY_NETWORK);
        assert_eq!(meta.priority, Priority::Critical);
    }

    #[test]
    fn reasons_with_detail_resolve_to_the_bare_code() {
        let (subject, _) = found("unverified-image:ghcr.io/acme/app:1.0");
        assert_eq!(subject, ExplainSubject::Reason(ids::REASON_UNVERIFIED_IMAGE));
    }

    #[test]
    fn unknown_identifier_lists_what_is_known() {
        let ExplainOutput::NotFound {
            identifier,
            available_check_ids,
            available_codes,
        } = run_explain("network.nope")
        else {
            panic!("expected NotFound");
        };
        assert_eq!(identifier, "network.nope");
        assert!(available_check_ids.contains(&ids::CHECK_IAM_PERMISSION_BOUNDARIES));
        assert!(available_codes.contains(&ids::REASON_TIMEOUT));
    }

    #[test]
    fn check_explanation_shows_the_control() {
        let (subject, exp) = found(ids::CHECK_NETWORK_FLOW_LOGS);
        let text = format_explanation(&subject, &exp);
        assert!(text.starts_with("VPC Flow Logs Enabled\n====="));
        assert!(text.contains("control:  CIS AWS 3.1"));
        assert!(text.contains("Remediation\n-----------\n"));
        assert!(text.contains("Before:\n```\n"));
    }

    #[test]
    fn reason_explanation_names_the_code() {
        let (subject, exp) = found(ids::REASON_PATTERN_VIOLATION);
        let text = format_explanation(&subject, &exp);
        assert!(text.contains("reason:   pattern-violation"));
        assert!(!text.contains("control:"));
    }

    #[test]
    fn not_found_lists_ids_and_codes() {
        let text = format_not_found("missing", &["network.one", "iam.two"], &["some-code"]);
        assert!(text.starts_with("unknown check id or reason code: missing\n"));
        assert!(text.contains("check ids:\n  network.one\n  iam.two\n"));
        assert!(text.contains("reason codes:\n  some-code\n"));
    }
}
