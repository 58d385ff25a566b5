//! Built-in compliance check battery.
//!
//! Every check reads a target snapshot (a JSON/YAML description of the
//! environment) through the path resolver. A section the check needs but the
//! snapshot lacks is a [`CheckError`], which the scanner records as FAIL.

use crate::error::CheckError;
use crate::model::PolicyDocument;
use crate::policy::Priority;
use crate::scan::{CheckFinding, CheckRef, ComplianceCheck};
use crate::verify::ImageVerifier;
use admitguard_types::ids;
use serde_json::Value;
use std::sync::Arc;

mod admission;
mod iam;
mod network;
mod utils;


type Probe = fn(&Value) -> Result<CheckFinding, CheckError>;

/// Static description of a built-in check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckMeta {
    pub id: &'static str,
    pub category: &'static str,
    pub priority: Priority,
    pub description: &'static str,
}

struct SnapshotCheck {
    meta: CheckMeta,
    probe: Probe,
}

impl ComplianceCheck for SnapshotCheck {
    fn id(&self) -> &str {
        self.meta.id
    }

    fn category(&self) -> &str {
        self.meta.category
    }

    fn priority(&self) -> Priority {
        self.meta.priority
    }

    fn description(&self) -> &str {
        self.meta.description
    }

    fn run(&self, snapshot: &Value) -> Result<CheckFinding, CheckError> {
        (self.probe)(snapshot)
    }
}

struct PolicyViolationsCheck {
    policies: Arc<Vec<PolicyDocument>>,
    verifier: Arc<dyn ImageVerifier>,
}

impl ComplianceCheck for PolicyViolationsCheck {
    fn id(&self) -> &str {
        POLICY_VIOLATIONS.id
    }

    fn category(&self) -> &str {
        POLICY_VIOLATIONS.category
    }

    fn priority(&self) -> Priority {
        POLICY_VIOLATIONS.priority
    }

    fn description(&self) -> &str {
        POLICY_VIOLATIONS.description
    }

    fn run(&self, snapshot: &Value) -> Result<CheckFinding, CheckError> {
        admission::policy_violations(snapshot, &self.policies, self.verifier.as_ref())
    }
}

const SNAPSHOT_CHECKS: &[(CheckMeta, Probe)] = &[
    (
        CheckMeta {
            id: ids::CHECK_NETWORK_FLOW_LOGS,
            category: ids::CATEGORY_NETWORK,
            priority: Priority::High,
            description: "CIS AWS 3.1: VPC flow logging is enabled",
        },
        network::flow_logs,
    ),
    (
        CheckMeta {
            id: ids::CHECK_NETWORK_ACL_COVERAGE,
            category: ids::CATEGORY_NETWORK,
            priority: Priority::High,
            description: "NIST CSF PR.AC-5: network integrity is protected by ACLs",
        },
        network::acl_coverage,
    ),
    (
        CheckMeta {
            id: ids::CHECK_NETWORK_SEGMENTATION,
            category: ids::CATEGORY_NETWORK,
            priority: Priority::Medium,
            description: "ISO 27001 A.13.1.1: networks are segmented and tagged",
        },
        network::segmentation,
    ),
    (
        CheckMeta {
            id: ids::CHECK_NETWORK_SECURITY_GROUPS,
            category: ids::CATEGORY_NETWORK,
            priority: Priority::Critical,
            description: "SOC 2 CC6.1: logical access is restricted by security groups",
        },
        network::security_groups,
    ),
    (
        CheckMeta {
            id: ids::CHECK_NETWORK_PRIVATE_SUBNET_EXPOSURE,
            category: ids::CATEGORY_NETWORK,
            priority: Priority::High,
            description: "Private subnets do not assign public IPs",
        },
        network::private_subnet_exposure,
    ),
    (
        CheckMeta {
            id: ids::CHECK_NETWORK_NACL_DEFAULT_DENY,
            category: ids::CATEGORY_NETWORK,
            priority: Priority::Low,
            description: "Network ACLs end in a deny-all entry",
        },
        network::nacl_default_deny,
    ),
    (
        CheckMeta {
            id: ids::CHECK_IAM_PERMISSION_BOUNDARIES,
            category: ids::CATEGORY_IAM,
            priority: Priority::High,
            description: "IAM roles carry permission boundaries",
        },
        iam::permission_boundaries,
    ),
];

const POLICY_VIOLATIONS: CheckMeta = CheckMeta {
    id: ids::CHECK_ADMISSION_POLICY_VIOLATIONS,
    category: ids::CATEGORY_ADMISSION,
    priority: Priority::Critical,
    description: "Workloads satisfy every enforce-mode admission policy",
};

/// Metadata for every built-in check, in declaration order.
pub fn builtin_metas() -> Vec<CheckMeta> {
    SNAPSHOT_CHECKS
        .iter()
        .map(|(meta, _)| *meta)
        .chain(std::iter::once(POLICY_VIOLATIONS))
        .collect()
}

/// The full built-in battery. `admission.policy_violations` evaluates `policies`.
pub fn builtin_checks(
    policies: Arc<Vec<PolicyDocument>>,
    verifier: Arc<dyn ImageVerifier>,
) -> Vec<CheckRef> {
    let mut out: Vec<CheckRef> = SNAPSHOT_CHECKS
        .iter()
        .map(|(meta, probe)| {
            Arc::new(SnapshotCheck {
                meta: *meta,
                probe: *probe,
            }) as CheckRef
        })
        .collect();
    out.push(Arc::new(PolicyViolationsCheck { policies, verifier }));
    out
}
