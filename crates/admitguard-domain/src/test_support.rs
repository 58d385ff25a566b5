use crate::error::CheckError;
use crate::policy::Priority;
use crate::scan::{CheckFinding, CheckRef, ComplianceCheck};
use admitguard_types::CheckStatus;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A check that always reports the same status, or always errors.
pub struct StaticCheck {
    id: String,
    status: Option<CheckStatus>,
    priority: Priority,
}

impl StaticCheck {
    pub fn new(id: &str, status: CheckStatus) -> Self {
        Self {
            id: id.to_string(),
            status: Some(status),
            priority: Priority::High,
        }
    }

    pub fn erroring(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: None,
            priority: Priority::High,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl ComplianceCheck for StaticCheck {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        "test"
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn description(&self) -> &str {
        "fixed result"
    }

    fn run(&self, _snapshot: &Value) -> Result<CheckFinding, CheckError> {
        match self.status {
            Some(status) => Ok(CheckFinding::new(status, status.as_str())),
            None => Err(CheckError::Probe("probe unavailable".to_string())),
        }
    }
}

struct FnCheck<F> {
    id: String,
    f: F,
}

impl<F> ComplianceCheck for FnCheck<F>
where
    F: Fn() -> CheckFinding + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        "test"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn description(&self) -> &str {
        "closure"
    }

    fn run(&self, _snapshot: &Value) -> Result<CheckFinding, CheckError> {
        Ok((self.f)())
    }
}

pub fn panicking_check(id: &str) -> CheckRef {
    Arc::new(FnCheck {
        id: id.to_string(),
        f: || -> CheckFinding { panic!("boom") },
    })
}

pub fn sleeping_check(id: &str, duration: Duration) -> CheckRef {
    Arc::new(FnCheck {
        id: id.to_string(),
        f: move || {
            std::thread::sleep(duration);
            CheckFinding::pass("slept")
        },
    })
}
