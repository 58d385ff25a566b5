//! Pure admission policy evaluation and compliance scoring (no IO).
//!
//! Input: parsed policy documents, resources and environment snapshots
//! constructed elsewhere.
//! Output: rule/policy decisions, check results, scores and reports.

#![forbid(unsafe_code)]

pub mod checks;
pub mod context;
pub mod error;
pub mod model;
pub mod pattern;
pub mod policy;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod score;
pub mod verify;

mod aggregate;
mod fingerprint;
mod load;
mod rule;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use aggregate::{evaluate_all, evaluate_policy};
pub use context::{EvaluationContext, RequestInfo, UserInfo};
pub use error::{CheckError, ParseError, ParseErrorKind, ResolutionError, ScanError};
pub use fingerprint::fingerprint_for_violation;
pub use load::{load, load_policy_set};
pub use report::{ScanMeta, admission_report, run_scan};
pub use rule::{container_images, evaluate_rule};
pub use verify::{ImageVerifier, TrustStore};
