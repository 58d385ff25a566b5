//! Render use cases: markdown and GitHub annotations from saved reports.

use crate::report::{ReportVariant, to_renderable};

pub fn render_markdown(report: &ReportVariant) -> String {
    admitguard_render::render_markdown(&to_renderable(report))
}

pub fn render_annotations(report: &ReportVariant, max: usize) -> Vec<String> {
    admitguard_render::render_github_annotations(&to_renderable(report))
        .into_iter()
        .take(max)
        .collect()
}
