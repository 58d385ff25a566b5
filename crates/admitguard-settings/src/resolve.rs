use crate::{model::AdmitguardConfigV1, presets};
use admitguard_domain::checks::builtin_metas;
use admitguard_domain::policy::{CheckPolicy, EffectiveConfig};
use admitguard_types::ids;
use anyhow::Context;
use std::collections::BTreeSet;
use std::time::Duration;

const KNOWN_CATEGORIES: &[&str] = &[ids::CATEGORY_NETWORK, ids::CATEGORY_IAM, ids::CATEGORY_ADMISSION];

/// Command-line values that win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub pass_threshold: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(
    cfg: AdmitguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "local".to_string());

    let mut effective = presets::preset(&profile);

    // Categories
    if let Some(categories) = &cfg.categories {
        effective.categories = parse_categories(categories)?;
    }

    // Threshold
    if let Some(threshold) = overrides.pass_threshold.or(cfg.pass_threshold) {
        effective.scoring.pass_threshold = parse_threshold(threshold)?;
    }

    // Scoring weights
    if let Some(scoring) = &cfg.scoring {
        if let Some(w) = scoring.warn_weight {
            effective.scoring.warn_weight = parse_weight("warn_weight", w)?;
        }
        if let Some(w) = scoring.info_weight {
            effective.scoring.info_weight = parse_weight("info_weight", w)?;
        }
    }

    // Execution
    if let Some(parallel) = cfg.parallel {
        effective.execution.parallel = parallel;
    }
    if let Some(ms) = cfg.timeout_ms {
        if ms == 0 {
            anyhow::bail!("timeout_ms must be greater than 0");
        }
        effective.execution.timeout = Some(Duration::from_millis(ms));
    }

    // per-check overrides
    let known: BTreeSet<&str> = builtin_metas().iter().map(|m| m.id).collect();
    for (check_id, cc) in cfg.checks.iter() {
        if !known.contains(check_id.as_str()) {
            anyhow::bail!("unknown check id in [checks]: {check_id}");
        }
        if let Some(enabled) = cc.enabled {
            let policy = if enabled {
                CheckPolicy::enabled()
            } else {
                CheckPolicy::disabled()
            };
            effective.checks.insert(check_id.clone(), policy);
        }
    }

    Ok(ResolvedConfig { effective })
}

fn parse_categories(values: &[String]) -> anyhow::Result<Option<BTreeSet<String>>> {
    if values.is_empty() || values.iter().any(|v| v == "all") {
        return Ok(None);
    }
    let mut out = BTreeSet::new();
    for v in values {
        if !KNOWN_CATEGORIES.contains(&v.as_str()) {
            anyhow::bail!(
                "unknown category: {v} (expected {} or all)",
                KNOWN_CATEGORIES.join("|")
            );
        }
        out.insert(v.clone());
    }
    Ok(Some(out))
}

fn parse_threshold(v: u32) -> anyhow::Result<u8> {
    u8::try_from(v)
        .ok()
        .filter(|t| *t <= 100)
        .with_context(|| format!("pass_threshold must be within 0..=100, got {v}"))
}

fn parse_weight(name: &str, v: f64) -> anyhow::Result<f64> {
    if !(0.0..=1.0).contains(&v) {
        anyhow::bail!("{name} must be within 0.0..=1.0, got {v}");
    }
    Ok(v)
}
