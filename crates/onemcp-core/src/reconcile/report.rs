//! Per-tool outcomes of multi-tool operations.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Written,
    /// Nothing to do for this tool (e.g. absent file on removal, unknown id).
    Skipped,
    Failed,
}

/// What happened to one tool's config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolWriteOutcome {
    pub tool_id: String,
    pub path: String,
    pub status: WriteStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

impl ToolWriteOutcome {
    pub fn written(
        tool_id: impl Into<String>,
        path: impl Into<String>,
        backup: Option<String>,
        servers: usize,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            path: path.into(),
            status: WriteStatus::Written,
            message: format!("Wrote {} server(s)", servers),
            backup,
        }
    }

    pub fn skipped(
        tool_id: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            path: path.into(),
            status: WriteStatus::Skipped,
            message: message.into(),
            backup: None,
        }
    }

    pub fn failed(
        tool_id: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        backup: Option<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            path: path.into(),
            status: WriteStatus::Failed,
            message: message.into(),
            backup,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == WriteStatus::Failed
    }
}

/// Result of a create/edit/delete/sync/restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    /// Id of the server the operation was about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    pub outcomes: Vec<ToolWriteOutcome>,
    pub warnings: Vec<String>,
}

impl OperationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_server(id: impl Into<String>) -> Self {
        Self {
            server_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn push(&mut self, outcome: ToolWriteOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// True when no tool write failed.
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(ToolWriteOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ToolWriteOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn outcome_for(&self, tool_id: &str) -> Option<&ToolWriteOutcome> {
        self.outcomes.iter().find(|o| o.tool_id == tool_id)
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        let count = |status: WriteStatus| self.outcomes.iter().filter(|o| o.status == status).count();
        format!(
            "{} written, {} skipped, {} failed",
            count(WriteStatus::Written),
            count(WriteStatus::Skipped),
            count(WriteStatus::Failed)
        )
    }
}
