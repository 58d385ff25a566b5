//! Use case orchestration for admitguard.
//!
//! This crate provides the application layer: use cases that coordinate the domain, repo, and
//! render layers. It is intentionally thin and delegates heavy lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod evaluate;
mod explain;
mod render;
mod report;
mod scan;

pub use evaluate::{EvaluateInput, EvaluateOutput, admission_exit_code, run_evaluate};
pub use explain::{ExplainOutput, ExplainSubject, format_explanation, format_not_found, run_explain};
pub use render::{render_annotations, render_markdown};
pub use report::{
    ReportVariant, parse_report_json, read_report, serialize_report, to_renderable,
};
pub use scan::{ScanInput, ScanOutput, read_check_set, run_scan_target, scan_exit_code};
