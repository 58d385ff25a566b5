use admitguard_domain::policy::{EffectiveConfig, ExecutionConfig, Priority, ScoringConfig};
use std::collections::BTreeMap;

pub const KNOWN_PROFILES: &[&str] = &["local", "staging", "production"];

const PRODUCTION_PASS_THRESHOLD: u8 = 90;

/// Environment presets.
///
/// Stricter environments run fewer, higher-priority checks. Unknown names get
/// the `local` defaults but keep their own name.
pub fn preset(profile: &str) -> EffectiveConfig {
    match profile {
        "production" => production_profile(),
        "staging" => staging_profile(),
        "local" => local_profile(),
        other => EffectiveConfig {
            profile: other.to_string(),
            ..local_profile()
        },
    }
}

fn local_profile() -> EffectiveConfig {
    EffectiveConfig {
        profile: "local".to_string(),
        max_priority: Priority::Low,
        categories: None,
        scoring: ScoringConfig::default(),
        execution: ExecutionConfig {
            parallel: true,
            timeout: None,
        },
        checks: BTreeMap::new(),
    }
}

fn staging_profile() -> EffectiveConfig {
    EffectiveConfig {
        profile: "staging".to_string(),
        max_priority: Priority::Medium,
        ..local_profile()
    }
}

fn production_profile() -> EffectiveConfig {
    EffectiveConfig {
        profile: "production".to_string(),
        max_priority: Priority::High,
        scoring: ScoringConfig {
            pass_threshold: PRODUCTION_PASS_THRESHOLD,
            ..ScoringConfig::default()
        },
        ..local_profile()
    }
}
