//! Check-set parsing and environment profile resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{AdmitguardConfigV1, CheckConfig, ScoringConfigV1};
pub use presets::{KNOWN_PROFILES, preset};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `admitguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<AdmitguardConfigV1> {
    let cfg: AdmitguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective scan configuration (profile preset + file values + overrides).
pub fn resolve_config(
    cfg: AdmitguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
