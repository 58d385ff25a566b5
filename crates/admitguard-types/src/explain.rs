//! Explain registry for checks and reason codes.
//!
//! Maps check IDs and rule reason codes to human-readable explanations with
//! remediation guidance.

use crate::ids;

/// Explanation entry for a check or reason code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the check/code.
    pub title: &'static str,
    /// What the check does and why it exists.
    pub description: &'static str,
    /// How to fix violations.
    pub remediation: &'static str,
    /// Before/after examples.
    pub examples: ExamplePair,
}

/// Before and after examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Input that would trigger a violation.
    pub before: &'static str,
    /// Input that passes.
    pub after: &'static str,
}

/// Look up an explanation by check_id or reason code.
///
/// A reason carrying a detail suffix (`unverified-image:nginx:1.25`) resolves to
/// its bare code. Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Check IDs
        ids::CHECK_NETWORK_FLOW_LOGS => Some(explain_flow_logs()),
        ids::CHECK_NETWORK_ACL_COVERAGE => Some(explain_acl_coverage()),
        ids::CHECK_NETWORK_SEGMENTATION => Some(explain_segmentation()),
        ids::CHECK_NETWORK_SECURITY_GROUPS => Some(explain_security_groups()),
        ids::CHECK_NETWORK_PRIVATE_SUBNET_EXPOSURE => Some(explain_private_subnet_exposure()),
        ids::CHECK_NETWORK_NACL_DEFAULT_DENY => Some(explain_nacl_default_deny()),
        ids::CHECK_IAM_PERMISSION_BOUNDARIES => Some(explain_permission_boundaries()),
        ids::CHECK_ADMISSION_POLICY_VIOLATIONS => Some(explain_policy_violations()),
        other => lookup_code(ids::reason_code(other)),
    }
}

fn lookup_code(code: &str) -> Option<Explanation> {
    match code {
        ids::REASON_NO_MATCH => Some(explain_no_match()),
        ids::REASON_PATTERN_SATISFIED => Some(explain_pattern_satisfied()),
        ids::REASON_PATTERN_VIOLATION => Some(explain_pattern_violation()),
        ids::REASON_VARIABLE_UNRESOLVED => Some(explain_variable_unresolved()),
        ids::REASON_IMAGES_VERIFIED => Some(explain_images_verified()),
        ids::REASON_NO_MATCHING_IMAGES => Some(explain_no_matching_images()),
        ids::REASON_UNVERIFIED_IMAGE => Some(explain_unverified_image()),
        ids::REASON_TIMEOUT => Some(explain_timeout()),
        ids::REASON_CHECK_ERROR => Some(explain_check_error()),
        _ => None,
    }
}

/// List all known check IDs.
pub fn all_check_ids() -> &'static [&'static str] {
    &[
        ids::CHECK_NETWORK_FLOW_LOGS,
        ids::CHECK_NETWORK_ACL_COVERAGE,
        ids::CHECK_NETWORK_SEGMENTATION,
        ids::CHECK_NETWORK_SECURITY_GROUPS,
        ids::CHECK_NETWORK_PRIVATE_SUBNET_EXPOSURE,
        ids::CHECK_NETWORK_NACL_DEFAULT_DENY,
        ids::CHECK_IAM_PERMISSION_BOUNDARIES,
        ids::CHECK_ADMISSION_POLICY_VIOLATIONS,
    ]
}

/// List all known reason codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::REASON_NO_MATCH,
        ids::REASON_PATTERN_SATISFIED,
        ids::REASON_PATTERN_VIOLATION,
        ids::REASON_VARIABLE_UNRESOLVED,
        ids::REASON_IMAGES_VERIFIED,
        ids::REASON_NO_MATCHING_IMAGES,
        ids::REASON_UNVERIFIED_IMAGE,
        ids::REASON_TIMEOUT,
        ids::REASON_CHECK_ERROR,
    ]
}

// --- Check-level explanations ---

fn explain_flow_logs() -> Explanation {
    Explanation {
        title: "VPC Flow Logs Enabled",
        description: "\
Verifies that the snapshot lists at least one flow log, and that every flow log
is ACTIVE, has a log destination and captures traffic type ALL, ACCEPT or REJECT.

Without flow logs there is no record of accepted or rejected traffic, which
leaves incident response and network forensics blind (CIS AWS 3.1).",
        remediation: "\
Create a flow log for each VPC and confirm its status is ACTIVE:

    aws ec2 create-flow-logs --resource-type VPC --resource-ids vpc-123 \\
        --traffic-type ALL --log-destination-type cloud-watch-logs",
        examples: ExamplePair {
            before: r#"flow_logs:
  - id: fl-1
    status: FAILED
    traffic_type: ALL"#,
            after: r#"flow_logs:
  - id: fl-1
    status: ACTIVE
    traffic_type: ALL
    destination: arn:aws:logs:eu-west-1:123456789012:log-group:vpc"#,
        },
    }
}

fn explain_acl_coverage() -> Explanation {
    Explanation {
        title: "Network ACL Coverage",
        description: "\
Verifies that every subnet references an existing network ACL that has entries.

An ACL that allows 0.0.0.0/0 on ports 80 or 443 is reported as a warning since
public web entry points are usually expected to be deliberate (NIST PR.AC-5).",
        remediation: "\
Associate each subnet with a network ACL and narrow broad allow entries to the
address ranges that actually need access.",
        examples: ExamplePair {
            before: r#"subnets:
  - id: subnet-1
    network_acl_id: acl-404
network_acls: []"#,
            after: r#"subnets:
  - id: subnet-1
    network_acl_id: acl-1
network_acls:
  - id: acl-1
    entries:
      - rule_number: 32767
        action: deny
        cidr: 0.0.0.0/0"#,
        },
    }
}

fn explain_segmentation() -> Explanation {
    Explanation {
        title: "Network Segmentation",
        description: "\
Verifies that each VPC is segmented. It needs both public and private subnets,
public subnets in more than one availability zone, and the `Project` and
`Environment` tags (ISO 27001 A.13.1.1).",
        remediation: "\
Split workloads across public and private subnets, spread public subnets over at
least two availability zones, and tag the VPC with `Project` and `Environment`.",
        examples: ExamplePair {
            before: r#"vpcs:
  - id: vpc-123
    tags: {}
subnets:
  - { id: subnet-1, vpc_id: vpc-123, public: true, availability_zone: us-east-1a }"#,
            after: r#"vpcs:
  - id: vpc-123
    tags: { Project: shop, Environment: production }
subnets:
  - { id: subnet-1, vpc_id: vpc-123, public: true, availability_zone: us-east-1a }
  - { id: subnet-2, vpc_id: vpc-123, public: true, availability_zone: us-east-1b }
  - { id: subnet-3, vpc_id: vpc-123, public: false, availability_zone: us-east-1a }"#,
        },
    }
}

fn explain_security_groups() -> Explanation {
    Explanation {
        title: "Security Group Ingress",
        description: "\
Flags security groups that accept ingress from 0.0.0.0/0 or ::/0.

Unrestricted ingress is reported as a warning: it is sometimes intended for a
load balancer but should never reach application or database tiers (SOC 2 CC6.1).",
        remediation: "\
Restrict ingress sources to known CIDR ranges or to other security groups.",
        examples: ExamplePair {
            before: r#"security_groups:
  - id: sg-1
    ingress:
      - { port: 22, cidr: 0.0.0.0/0 }"#,
            after: r#"security_groups:
  - id: sg-1
    ingress:
      - { port: 22, cidr: 10.0.0.0/16 }"#,
        },
    }
}

fn explain_private_subnet_exposure() -> Explanation {
    Explanation {
        title: "Private Subnet Exposure",
        description: "\
Verifies that private subnets do not auto-assign public IP addresses
(`map_public_ip_on_launch` must be false).",
        remediation: "\
Disable public IP assignment on private subnets:

    aws ec2 modify-subnet-attribute --subnet-id subnet-2 --no-map-public-ip-on-launch",
        examples: ExamplePair {
            before: r#"subnets:
  - { id: subnet-2, public: false, map_public_ip_on_launch: true }"#,
            after: r#"subnets:
  - { id: subnet-2, public: false, map_public_ip_on_launch: false }"#,
        },
    }
}

fn explain_nacl_default_deny() -> Explanation {
    Explanation {
        title: "Network ACL Default Deny",
        description: "\
Verifies that every network ACL ends in a deny-all entry covering 0.0.0.0/0.",
        remediation: "\
Keep the catch-all deny entry (rule 32767 in AWS) on every network ACL.",
        examples: ExamplePair {
            before: r#"network_acls:
  - id: acl-1
    entries:
      - { rule_number: 100, action: allow, cidr: 0.0.0.0/0 }"#,
            after: r#"network_acls:
  - id: acl-1
    entries:
      - { rule_number: 100, action: allow, cidr: 10.0.0.0/16 }
      - { rule_number: 32767, action: deny, cidr: 0.0.0.0/0 }"#,
        },
    }
}

fn explain_permission_boundaries() -> Explanation {
    Explanation {
        title: "IAM Permission Boundaries",
        description: "\
Verifies that every IAM role has a permission boundary attached.

A snapshot with no roles produces INFO rather than PASS.",
        remediation: "\
Attach a permission boundary policy to each role:

    aws iam put-role-permissions-boundary --role-name app \\
        --permissions-boundary arn:aws:iam::123456789012:policy/boundary",
        examples: ExamplePair {
            before: r#"iam:
  roles:
    - { name: app }"#,
            after: r#"iam:
  roles:
    - { name: app, permission_boundary: "arn:aws:iam::123456789012:policy/boundary" }"#,
        },
    }
}

fn explain_policy_violations() -> Explanation {
    Explanation {
        title: "Admission Policy Violations",
        description: "\
Evaluates the loaded admission policies against every entry of `workloads`.

Any blocking denial (an enforce policy that denied) fails the check. Denials that
come only from audit policies produce a warning. With no policies loaded the
check reports INFO.",
        remediation: "\
Run `admitguard evaluate` against the offending workload to see which rules deny
it, then fix the resource or the policy.",
        examples: ExamplePair {
            before: r#"workloads:
  - kind: Pod
    spec:
      containers:
        - { name: web, image: "nginx:latest" }"#,
            after: r#"workloads:
  - kind: Pod
    spec:
      containers:
        - { name: web, image: "nginx:1.25" }"#,
        },
    }
}

// --- Reason-level explanations ---

fn explain_no_match() -> Explanation {
    Explanation {
        title: "Rule Did Not Match",
        description: "\
The resource's kind, namespace or labels are outside the rule's match selector,
so the rule does not apply.",
        remediation: "No action needed.",
        examples: ExamplePair {
            before: "match: { resources: { kinds: [Deployment] } }  # resource is a Pod",
            after: "match: { resources: { kinds: [Pod] } }",
        },
    }
}

fn explain_pattern_satisfied() -> Explanation {
    Explanation {
        title: "Pattern Satisfied",
        description: "The resource conforms to the rule's validation pattern.",
        remediation: "No action needed.",
        examples: ExamplePair {
            before: "image: nginx",
            after: "image: nginx:1.25  # pattern \"*:*\"",
        },
    }
}

fn explain_pattern_violation() -> Explanation {
    Explanation {
        title: "Pattern Violation",
        description: "\
The resource does not conform to the rule's validation pattern. Every key named
in the pattern must be present and match; missing keys are violations.

Pattern scalars may contain `*` and `?` wildcards. A bare `*` accepts any
non-null scalar.",
        remediation: "\
Update the resource so that each field named by the pattern exists and matches.",
        examples: ExamplePair {
            before: r#"spec:
  containers:
    - { name: web, image: nginx }"#,
            after: r#"spec:
  containers:
    - { name: web, image: "nginx:1.25" }"#,
        },
    }
}

fn explain_variable_unresolved() -> Explanation {
    Explanation {
        title: "Variable Unresolved",
        description: "\
A `{{ ... }}` expression in the pattern referenced a path that does not exist in
the evaluation context. Enforce policies deny; audit policies treat the rule as
not applicable.",
        remediation: "\
Check the expression path (for example `request.object.metadata.name`) or add the
referenced field to the resource.",
        examples: ExamplePair {
            before: "name: \"{{ request.object.metadata.labels.app }}\"  # no labels",
            after: "name: \"{{ request.object.metadata.name }}\"",
        },
    }
}

fn explain_images_verified() -> Explanation {
    Explanation {
        title: "Images Verified",
        description: "Every container image matched by the rule verified against its key.",
        remediation: "No action needed.",
        examples: ExamplePair {
            before: "image: registry.example.com/app:1.0  # unsigned",
            after: "image: registry.example.com/app:1.0  # signed with the trusted key",
        },
    }
}

fn explain_no_matching_images() -> Explanation {
    Explanation {
        title: "No Matching Images",
        description: "\
None of the resource's container images match the rule's image globs, so there
was nothing to verify.",
        remediation: "No action needed.",
        examples: ExamplePair {
            before: "verifyImages: [{ image: \"registry.example.com/*\" }]",
            after: "image: docker.io/library/busybox:1.36",
        },
    }
}

fn explain_unverified_image() -> Explanation {
    Explanation {
        title: "Unverified Image",
        description: "\
A container image matched the rule's image glob but did not verify against the
configured key. The reason detail names the first failing image reference.",
        remediation: "\
Sign the image with the trusted key, or add its reference to the trust store.",
        examples: ExamplePair {
            before: r#"keys:
  - key: cosign.pub
    images: []"#,
            after: r#"keys:
  - key: cosign.pub
    images: ["registry.example.com/app:1.0"]"#,
        },
    }
}

fn explain_timeout() -> Explanation {
    Explanation {
        title: "Check Timed Out",
        description: "\
The compliance check did not finish before the configured timeout and was
recorded as FAIL.",
        remediation: "\
Raise `timeout_ms` in admitguard.toml or reduce the snapshot size.",
        examples: ExamplePair {
            before: "timeout_ms = 10",
            after: "timeout_ms = 30000",
        },
    }
}

fn explain_check_error() -> Explanation {
    Explanation {
        title: "Check Error",
        description: "\
The compliance check could not run, usually because the snapshot is missing the
section it inspects. The check is recorded as FAIL with the error in its details.",
        remediation: "\
Make sure the target snapshot includes the section the check needs (for example
`vpcs`, `subnets`, `network_acls` or `iam.roles`).",
        examples: ExamplePair {
            before: "{}",
            after: "{ \"vpcs\": [] }",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_check_id() {
        assert!(lookup_explanation(ids::CHECK_NETWORK_FLOW_LOGS).is_some());
        assert!(lookup_explanation(ids::CHECK_IAM_PERMISSION_BOUNDARIES).is_some());
        assert!(lookup_explanation(ids::CHECK_ADMISSION_POLICY_VIOLATIONS).is_some());
    }

    #[test]
    fn lookup_by_reason_with_detail() {
        let exp = lookup_explanation("unverified-image:nginx:latest").expect("known code");
        assert_eq!(exp.title, "Unverified Image");
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup_explanation("unknown.check").is_none());
        assert!(lookup_explanation("unknown-code").is_none());
    }

    #[test]
    fn all_check_ids_are_valid() {
        for id in all_check_ids() {
            assert!(
                lookup_explanation(id).is_some(),
                "check_id {} should be in registry",
                id
            );
        }
    }

    #[test]
    fn all_codes_are_valid() {
        for code in all_codes() {
            assert!(
                lookup_explanation(code).is_some(),
                "code {} should be in registry",
                code
            );
        }
    }
}
