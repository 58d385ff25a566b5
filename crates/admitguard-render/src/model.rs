#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Warn,
    Fail,
}

/// One `label: value` line of the report header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFact {
    pub label: String,
    pub value: String,
}

impl RenderableFact {
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFinding {
    pub severity: RenderableSeverity,
    /// Check id, or `policy/rule` for admission violations.
    pub source: String,
    pub code: String,
    pub message: String,
    /// Resource or target the finding is about.
    pub subject: Option<String>,
    pub help: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub title: String,
    pub verdict: RenderableVerdictStatus,
    pub facts: Vec<RenderableFact>,
    pub findings: Vec<RenderableFinding>,
}
