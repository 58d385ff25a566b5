use crate::{RenderableReport, RenderableSeverity, RenderableVerdictStatus};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", report.title));
    let verdict = match report.verdict {
        RenderableVerdictStatus::Pass => "PASS",
        RenderableVerdictStatus::Warn => "WARN",
        RenderableVerdictStatus::Fail => "FAIL",
    };
    out.push_str(&format!("- Verdict: **{}**\n", verdict));
    for fact in &report.facts {
        out.push_str(&format!("- {}: {}\n", fact.label, fact.value));
    }
    out.push('\n');

    if report.findings.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    out.push_str("## Findings\n\n");

    for f in &report.findings {
        let sev = match f.severity {
            RenderableSeverity::Info => "INFO",
            RenderableSeverity::Warning => "WARN",
            RenderableSeverity::Error => "ERROR",
        };

        match &f.subject {
            Some(subject) => out.push_str(&format!(
                "- [{}] `{}` / `{}` on `{}`: {}\n",
                sev, f.source, f.code, subject, f.message
            )),
            None => out.push_str(&format!(
                "- [{}] `{}` / `{}`: {}\n",
                sev, f.source, f.code, f.message
            )),
        }

        if let Some(help) = &f.help {
            out.push_str(&format!("  - help: {}\n", help));
        }
    }

    out
}
