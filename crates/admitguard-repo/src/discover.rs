use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

/// File names treated as policy documents.
pub const POLICY_FILE_GLOBS: &[&str] = &["*.yaml", "*.yml", "*.json"];

/// Discover policy files under `dir`.
///
/// Behavior:
/// - A file path is returned as-is (single policy file).
/// - A directory is walked recursively; hidden entries are skipped.
/// - Results are sorted by path so evaluation order is stable across platforms.
pub fn discover_policy_files(dir: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let meta = std::fs::metadata(dir).with_context(|| format!("stat {dir}"))?;
    if meta.is_file() {
        return Ok(vec![dir.to_path_buf()]);
    }

    let patterns: Vec<String> = POLICY_FILE_GLOBS.iter().map(|s| s.to_string()).collect();
    let set = build_globset(&patterns).context("compile policy file globset")?;

    let mut out: Vec<Utf8PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| set.is_match(e.file_name()))
        .filter_map(|e| pathbuf_to_utf8(e.path().to_path_buf()))
        .collect();

    out.sort();
    out.dedup();
    tracing::debug!(dir = %dir, files = out.len(), "discovered policy files");
    Ok(out)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

fn pathbuf_to_utf8(p: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(p).ok()
}

pub(crate) fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        b.add(Glob::new(p).with_context(|| format!("invalid glob: {p}"))?);
    }
    Ok(b.build()?)
}
