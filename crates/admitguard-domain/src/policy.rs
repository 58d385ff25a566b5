use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PASS_THRESHOLD: u8 = 80;

/// Check priority. Lower numbers run in stricter environments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl Priority {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Priority::Critical),
            2 => Some(Priority::High),
            3 => Some(Priority::Medium),
            4 => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights applied when scoring. PASS counts 1, FAIL counts 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringConfig {
    pub warn_weight: f64,
    pub info_weight: f64,
    pub pass_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            warn_weight: 0.0,
            info_weight: 0.0,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub parallel: bool,
    /// Scan-level deadline. Checks still running when it passes are recorded as FAIL.
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckPolicy {
    pub enabled: bool,
}

impl CheckPolicy {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveConfig {
    pub profile: String,
    /// Checks with a priority number above this are skipped.
    pub max_priority: Priority,
    /// `None` selects every category.
    pub categories: Option<BTreeSet<String>>,
    pub scoring: ScoringConfig,
    pub execution: ExecutionConfig,
    /// Per-check overrides. Checks without an entry are enabled.
    pub checks: BTreeMap<String, CheckPolicy>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            profile: "local".to_string(),
            max_priority: Priority::Low,
            categories: None,
            scoring: ScoringConfig::default(),
            execution: ExecutionConfig::default(),
            checks: BTreeMap::new(),
        }
    }
}

impl EffectiveConfig {
    pub fn check_enabled(&self, check_id: &str) -> bool {
        self.checks.get(check_id).is_none_or(|p| p.enabled)
    }

    /// Whether a check with this metadata is part of the scan.
    pub fn selects(&self, check_id: &str, category: &str, priority: Priority) -> bool {
        let category_ok = self
            .categories
            .as_ref()
            .is_none_or(|set| set.contains(category));
        category_ok && priority <= self.max_priority && self.check_enabled(check_id)
    }
}
