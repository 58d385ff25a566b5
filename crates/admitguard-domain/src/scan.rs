//! Compliance scanner: runs independent checks against an immutable snapshot.
//!
//! A check that errors or panics becomes a FAIL result; a check that misses
//! the scan deadline becomes a FAIL with reason `timeout`. Results always come
//! back in declaration order.

use crate::error::CheckError;
use crate::policy::{EffectiveConfig, ExecutionConfig, Priority};
use admitguard_types::ids;
use admitguard_types::{CheckResult, CheckStatus};
use rayon::prelude::*;
use serde_json::{Value, json};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

pub trait ComplianceCheck: Send + Sync {
    /// Stable dotted id, e.g. `network.flow_logs`.
    fn id(&self) -> &str;
    fn category(&self) -> &str;
    fn priority(&self) -> Priority;
    /// The control this check covers.
    fn description(&self) -> &str;
    fn run(&self, snapshot: &Value) -> Result<CheckFinding, CheckError>;
}

/// What a check reports; the scanner adds the check id.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckFinding {
    pub status: CheckStatus,
    pub message: String,
    pub details: Value,
}

impl CheckFinding {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: json!({}),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Fail, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warn, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Info, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

pub type CheckRef = Arc<dyn ComplianceCheck>;

/// Keep the checks the configuration selects, in their original order.
pub fn select_checks(checks: &[CheckRef], cfg: &EffectiveConfig) -> Vec<CheckRef> {
    checks
        .iter()
        .filter(|c| cfg.selects(c.id(), c.category(), c.priority()))
        .cloned()
        .collect()
}

/// Run checks and return one result per check, in declaration order.
pub fn run_checks(checks: &[CheckRef], snapshot: &Value, exec: &ExecutionConfig) -> Vec<CheckResult> {
    match exec.timeout {
        Some(timeout) => run_with_deadline(checks, snapshot, exec.parallel, timeout),
        None if exec.parallel => checks
            .par_iter()
            .map(|check| run_one(check.as_ref(), snapshot))
            .collect(),
        None => checks
            .iter()
            .map(|check| run_one(check.as_ref(), snapshot))
            .collect(),
    }
}

/// Execute a single check, converting errors and panics into FAIL.
pub fn run_one(check: &dyn ComplianceCheck, snapshot: &Value) -> CheckResult {
    let outcome = catch_unwind(AssertUnwindSafe(|| check.run(snapshot)));
    let finding = match outcome {
        Ok(Ok(finding)) => finding,
        Ok(Err(err)) => {
            tracing::warn!(check = check.id(), error = %err, "compliance check errored");
            error_finding(&err.to_string())
        }
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            tracing::warn!(check = check.id(), error = %msg, "compliance check panicked");
            error_finding(&format!("check panicked: {msg}"))
        }
    };
    CheckResult {
        name: check.id().to_string(),
        status: finding.status,
        message: finding.message,
        details: finding.details,
    }
}

fn error_finding(error: &str) -> CheckFinding {
    CheckFinding::fail(format!("check could not complete: {error}"))
        .with_details(json!({ "reason": ids::REASON_CHECK_ERROR, "error": error }))
}

fn timeout_result(check: &dyn ComplianceCheck, timeout: Duration) -> CheckResult {
    let ms = timeout.as_millis() as u64;
    tracing::warn!(check = check.id(), timeout_ms = ms, "compliance check timed out");
    CheckResult {
        name: check.id().to_string(),
        status: CheckStatus::Fail,
        message: format!("check did not complete within {ms} ms"),
        details: json!({ "reason": ids::REASON_TIMEOUT, "timeout_ms": ms }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run on worker threads and stop waiting at the deadline.
///
/// Parallel mode gives each check its own thread; sequential mode runs them
/// one after another on a single worker. Workers still running at the deadline
/// are detached and their results discarded.
fn run_with_deadline(
    checks: &[CheckRef],
    snapshot: &Value,
    parallel: bool,
    timeout: Duration,
) -> Vec<CheckResult> {
    let deadline = Instant::now() + timeout;
    let snapshot = Arc::new(snapshot.clone());
    let (tx, rx) = mpsc::channel::<(usize, CheckResult)>();

    let lanes: Vec<Vec<(usize, CheckRef)>> = if parallel {
        checks
            .iter()
            .cloned()
            .enumerate()
            .map(|entry| vec![entry])
            .collect()
    } else {
        vec![checks.iter().cloned().enumerate().collect()]
    };

    for lane in lanes {
        let tx = tx.clone();
        let snapshot = Arc::clone(&snapshot);
        thread::spawn(move || {
            for (idx, check) in lane {
                let result = run_one(check.as_ref(), &snapshot);
                if tx.send((idx, result)).is_err() {
                    return;
                }
            }
        });
    }
    drop(tx);

    let mut slots: Vec<Option<CheckResult>> = vec![None; checks.len()];
    let mut remaining = checks.len();
    while remaining > 0 {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        match rx.recv_timeout(deadline - now) {
            Ok((idx, result)) => {
                slots[idx] = Some(result);
                remaining -= 1;
            }
            Err(_) => break,
        }
    }

    slots
        .into_iter()
        .zip(checks)
        .map(|(slot, check)| slot.unwrap_or_else(|| timeout_result(check.as_ref(), timeout)))
        .collect()
}
