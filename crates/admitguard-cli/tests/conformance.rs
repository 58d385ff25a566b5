//! Conformance tests for admitguard.
//!
//! These tests validate:
//! 1. All check IDs and reason codes have explanations
//! 2. Id and code naming conventions
//! 3. Golden reports parse and use known check ids and reasons

use admitguard_types::{AdmissionReport, ComplianceReport, explain, ids};
use serde_json::Value;
use std::path::PathBuf;

fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("admitguard-cli should have parent")
        .parent()
        .expect("crates should have parent")
        .join("tests")
        .join("fixtures")
        .join("golden")
}

/// Every `*.report.json` under the golden directory, parsed.
fn golden_reports() -> Vec<(String, Value)> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(golden_dir()).expect("Failed to read golden dir") {
        let path = entry.expect("Failed to read entry").path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if !name.ends_with(".report.json") {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
        let report: Value = serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Golden {name} has invalid JSON: {e}"));
        out.push((name, report));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

// =============================================================================
// Explanation Coverage Tests
// =============================================================================

#[test]
fn all_check_ids_have_explanations() {
    for check_id in explain::all_check_ids() {
        let exp = explain::lookup_explanation(check_id)
            .unwrap_or_else(|| panic!("Check ID '{check_id}' has no explanation in registry"));
        assert!(!exp.title.is_empty(), "Check ID '{check_id}' has empty title");
        assert!(
            !exp.description.is_empty(),
            "Check ID '{check_id}' has empty description"
        );
        assert!(
            !exp.remediation.is_empty(),
            "Check ID '{check_id}' has empty remediation"
        );
    }
}

#[test]
fn all_codes_have_explanations() {
    for code in explain::all_codes() {
        let exp = explain::lookup_explanation(code)
            .unwrap_or_else(|| panic!("Code '{code}' has no explanation in registry"));
        assert!(!exp.title.is_empty(), "Code '{code}' has empty title");
        assert!(!exp.remediation.is_empty(), "Code '{code}' has empty remediation");
    }
}

#[test]
fn check_ids_and_codes_are_consistent() {
    for check_id in explain::all_check_ids() {
        let (category, rest) = check_id
            .split_once('.')
            .unwrap_or_else(|| panic!("Check ID '{check_id}' should be dotted"));
        assert!(
            [ids::CATEGORY_NETWORK, ids::CATEGORY_IAM, ids::CATEGORY_ADMISSION].contains(&category),
            "Check ID '{check_id}' has unknown category '{category}'"
        );
        assert!(
            rest.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
            "Check ID '{check_id}' should be snake_case after the category"
        );
    }

    for code in explain::all_codes() {
        assert!(!code.contains('.'), "Code '{code}' should not contain dots");
        assert!(
            code.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
            "Code '{code}' should be kebab-case"
        );
    }
}

// =============================================================================
// Known Check IDs and Codes Inventory
// =============================================================================

#[test]
fn known_check_ids_are_documented() {
    let known_check_ids = [
        ids::CHECK_NETWORK_FLOW_LOGS,
        ids::CHECK_NETWORK_ACL_COVERAGE,
        ids::CHECK_NETWORK_SEGMENTATION,
        ids::CHECK_NETWORK_SECURITY_GROUPS,
        ids::CHECK_NETWORK_PRIVATE_SUBNET_EXPOSURE,
        ids::CHECK_NETWORK_NACL_DEFAULT_DENY,
        ids::CHECK_IAM_PERMISSION_BOUNDARIES,
        ids::CHECK_ADMISSION_POLICY_VIOLATIONS,
    ];

    let registered = explain::all_check_ids();
    for id in &known_check_ids {
        assert!(registered.contains(id), "Known check ID '{id}' is not in all_check_ids()");
    }
    for id in registered {
        assert!(
            known_check_ids.contains(id),
            "Check ID '{id}' in registry but not in known_check_ids test - update the test"
        );
    }
}

#[test]
fn known_codes_are_documented() {
    let known_codes = [
        ids::REASON_NO_MATCH,
        ids::REASON_PATTERN_SATISFIED,
        ids::REASON_PATTERN_VIOLATION,
        ids::REASON_VARIABLE_UNRESOLVED,
        ids::REASON_IMAGES_VERIFIED,
        ids::REASON_NO_MATCHING_IMAGES,
        ids::REASON_UNVERIFIED_IMAGE,
        ids::REASON_TIMEOUT,
        ids::REASON_CHECK_ERROR,
    ];

    let registered = explain::all_codes();
    for code in &known_codes {
        assert!(registered.contains(code), "Known code '{code}' is not in all_codes()");
    }
    for code in registered {
        assert!(
            known_codes.contains(code),
            "Code '{code}' in registry but not in known_codes test - update the test"
        );
    }
}

// =============================================================================
// Golden Report Validation
// =============================================================================

#[test]
fn golden_reports_deserialize_into_their_schema() {
    let reports = golden_reports();
    assert!(reports.len() >= 2, "expected admission and compliance goldens");

    for (name, report) in reports {
        match report["schema"].as_str() {
            Some(admitguard_types::SCHEMA_ADMISSION_REPORT_V1) => {
                let parsed: Result<AdmissionReport, _> = serde_json::from_value(with_timestamps(report));
                assert!(parsed.is_ok(), "Golden {name}: {}", parsed.unwrap_err());
            }
            Some(admitguard_types::SCHEMA_COMPLIANCE_REPORT_V1) => {
                let parsed: Result<ComplianceReport, _> =
                    serde_json::from_value(with_timestamps(report));
                assert!(parsed.is_ok(), "Golden {name}: {}", parsed.unwrap_err());
            }
            other => panic!("Golden {name} has unexpected schema {other:?}"),
        }
    }
}

/// Swap timestamp placeholders for a real RFC 3339 instant so the typed model accepts them.
fn with_timestamps(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        for key in ["started_at", "finished_at", "timestamp"] {
            if obj.contains_key(key) {
                obj.insert(key.to_string(), Value::from("2026-01-01T00:00:00Z"));
            }
        }
    }
    value
}

#[test]
fn golden_findings_use_known_ids_and_reasons() {
    let check_ids = explain::all_check_ids();

    for (name, report) in golden_reports() {
        if let Some(checks) = report["checks"].as_array() {
            for check in checks {
                let id = check["name"].as_str().unwrap_or_default();
                assert!(check_ids.contains(&id), "Golden {name} has unknown check '{id}'");
                let status = check["status"].as_str().unwrap_or_default();
                assert!(
                    ["PASS", "FAIL", "WARN", "INFO"].contains(&status),
                    "Golden {name} check '{id}' has invalid status '{status}'"
                );
            }
        }

        for decision in report["decisions"].as_array().into_iter().flatten() {
            for policy in decision["policies"].as_array().into_iter().flatten() {
                for violation in policy["violations"].as_array().into_iter().flatten() {
                    let reason = violation["reason"].as_str().unwrap_or_default();
                    assert!(
                        explain::lookup_explanation(reason).is_some(),
                        "Golden {name} has unknown reason '{reason}'"
                    );
                    assert_eq!(
                        violation["fingerprint"].as_str().map(str::len),
                        Some(64),
                        "Golden {name} violation needs a sha256 fingerprint"
                    );
                }
            }
        }
    }
}

#[test]
fn golden_summaries_are_internally_consistent() {
    for (name, report) in golden_reports() {
        let Some(summary) = report.get("summary") else {
            continue;
        };
        let count = |status: &str| {
            report["checks"]
                .as_array()
                .unwrap()
                .iter()
                .filter(|c| c["status"] == status)
                .count() as u64
        };
        assert_eq!(summary["total"], report["checks"].as_array().unwrap().len() as u64, "{name}");
        assert_eq!(summary["passed"], count("PASS"), "{name}");
        assert_eq!(summary["failed"], count("FAIL"), "{name}");
        assert_eq!(summary["warnings"], count("WARN"), "{name}");
        assert_eq!(summary["info"], count("INFO"), "{name}");
        let passed = summary["score"].as_u64() >= summary["threshold"].as_u64();
        assert_eq!(summary["passed_threshold"], passed, "{name}");
    }
}
