//! Rendering utilities for CI surfaces (Markdown, GitHub annotations).
//!
//! Renderers work on a report-agnostic model so admission and compliance
//! reports share one output path.

#![forbid(unsafe_code)]

mod gha;
mod markdown;
mod model;

pub use gha::render_github_annotations;
pub use markdown::render_markdown;
pub use model::{
    RenderableFact, RenderableFinding, RenderableReport, RenderableSeverity,
    RenderableVerdictStatus,
};
