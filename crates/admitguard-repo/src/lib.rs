//! Filesystem adapters: discover policy files and load YAML/JSON documents.
//!
//! This crate is allowed to do filesystem IO. It hands plain `serde_json::Value`
//! trees and loaded domain types to the caller; evaluation stays in the domain crate.

#![forbid(unsafe_code)]

mod discover;
mod parse;

use admitguard_domain::load;
use admitguard_domain::model::PolicyDocument;
use admitguard_domain::verify::{TrustStore, TrustStoreFile};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::collections::BTreeMap;

pub use discover::{POLICY_FILE_GLOBS, discover_policy_files};
pub use parse::{DocumentFormat, parse_documents, parse_single_mapping};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;

    /// Parse arbitrary text as a YAML document stream.
    ///
    /// Returns the number of non-empty documents. **Never panics** on any input.
    pub fn parse_yaml_stream(text: &str) -> anyhow::Result<usize> {
        Ok(parse::parse_documents(text, DocumentFormat::Yaml)?.len())
    }

    /// Parse arbitrary text as policy documents (YAML stream).
    ///
    /// Returns `Ok(...)` when every document loads as a policy,
    /// `Err(...)` otherwise. **Never panics** on any input.
    pub fn parse_policies(text: &str) -> anyhow::Result<Vec<PolicyDocument>> {
        let docs = parse::parse_documents(text, DocumentFormat::Yaml)?;
        Ok(admitguard_domain::load_policy_set(&docs)?)
    }

    /// Match candidate file names against the policy file globs.
    ///
    /// **Never panics** on any input.
    pub fn match_policy_names(candidates: &[String]) -> anyhow::Result<Vec<String>> {
        let patterns: Vec<String> = POLICY_FILE_GLOBS.iter().map(|s| s.to_string()).collect();
        let set = discover::build_globset(&patterns)?;
        Ok(candidates
            .iter()
            .filter(|c| set.is_match(c.as_str()))
            .cloned()
            .collect())
    }
}

/// Read a file and parse every document it holds.
pub fn read_documents(path: &Utf8Path) -> anyhow::Result<Vec<Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    parse::parse_documents(&text, DocumentFormat::for_path(path))
        .with_context(|| format!("parse {path}"))
}

/// Load every policy under `dir` (or the single file `dir` names).
///
/// Files load in sorted path order and documents in stream order. Policy names
/// must be unique across the whole set.
pub fn load_policy_dir(dir: &Utf8Path) -> anyhow::Result<Vec<PolicyDocument>> {
    let files = discover_policy_files(dir).context("discover policy files")?;

    let mut origins: BTreeMap<String, Utf8PathBuf> = BTreeMap::new();
    let mut out = Vec::new();
    for file in files {
        for (idx, doc) in read_documents(&file)?.iter().enumerate() {
            let policy = load(doc).with_context(|| format!("load policy {file} (document {idx})"))?;
            if let Some(first) = origins.get(&policy.name) {
                anyhow::bail!(
                    "duplicate policy name `{}` in {file} (first defined in {first})",
                    policy.name
                );
            }
            origins.insert(policy.name.clone(), file.clone());
            out.push(policy);
        }
    }

    tracing::debug!(dir = %dir, policies = out.len(), "loaded policy set");
    Ok(out)
}

/// Load the resource documents to evaluate. At least one is required.
pub fn load_resources(path: &Utf8Path) -> anyhow::Result<Vec<Value>> {
    let docs = read_documents(path)?;
    if docs.is_empty() {
        anyhow::bail!("{path} holds no resource documents");
    }
    for (idx, doc) in docs.iter().enumerate() {
        if !doc.is_object() {
            anyhow::bail!("{path} document {idx} is not a mapping");
        }
    }
    Ok(docs)
}

/// Load a target snapshot: one mapping describing the environment to scan.
pub fn load_snapshot(path: &Utf8Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    parse::parse_single_mapping(&text, DocumentFormat::for_path(path))
        .with_context(|| format!("parse snapshot {path}"))
}

/// Load a trust store file (`keys: [{key, images: [...]}]`).
pub fn load_trust_store(path: &Utf8Path) -> anyhow::Result<TrustStore> {
    let doc = load_snapshot(path).with_context(|| format!("load trust store {path}"))?;
    let file: TrustStoreFile =
        serde_json::from_value(doc).with_context(|| format!("decode trust store {path}"))?;
    Ok(TrustStore::from(file))
}

/// Read a UTF-8 text file, for callers that parse it themselves (check sets, reports).
pub fn read_text(path: &Utf8Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {path}"))
}
