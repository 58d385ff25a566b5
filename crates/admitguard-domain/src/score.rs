use crate::error::ScanError;
use crate::policy::ScoringConfig;
use admitguard_types::{CheckResult, CheckStatus, ComplianceSummary};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pass: u32,
    pub fail: u32,
    pub warn: u32,
    pub info: u32,
}

impl StatusCounts {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut counts = StatusCounts::default();
        for r in results {
            match r.status {
                CheckStatus::Pass => counts.pass += 1,
                CheckStatus::Fail => counts.fail += 1,
                CheckStatus::Warn => counts.warn += 1,
                CheckStatus::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.pass + self.fail + self.warn + self.info
    }
}

/// `round(100 * weighted_passes / total)`, rounding half away from zero.
///
/// PASS weighs 1, FAIL 0, WARN and INFO their configured weights (0 by
/// default, so only PASS counts).
pub fn score(counts: &StatusCounts, scoring: &ScoringConfig) -> Result<u8, ScanError> {
    let total = counts.total();
    if total == 0 {
        return Err(ScanError::EmptyCheckSet);
    }
    let weighted = f64::from(counts.pass)
        + scoring.warn_weight * f64::from(counts.warn)
        + scoring.info_weight * f64::from(counts.info);
    let pct = (100.0 * weighted / f64::from(total)).round();
    Ok(pct.clamp(0.0, 100.0) as u8)
}

/// Score results and build the report summary.
pub fn summarize(
    results: &[CheckResult],
    scoring: &ScoringConfig,
) -> Result<ComplianceSummary, ScanError> {
    let counts = StatusCounts::from_results(results);
    let score = score(&counts, scoring)?;
    Ok(ComplianceSummary {
        score,
        total: counts.total(),
        passed: counts.pass,
        failed: counts.fail,
        warnings: counts.warn,
        info: counts.info,
        threshold: scoring.pass_threshold,
        passed_threshold: score >= scoring.pass_threshold,
    })
}
